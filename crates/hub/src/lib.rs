//! # GRC Hub
//!
//! One instance of every service, wired together:
//!
//! ```text
//!  operation ──► service ──► EventBus ──► AuditTrail (audit sink)
//!                               │
//!                               └──────► NotificationEngine (subscriber "*")
//! ```

mod dashboard;
mod grc_hub;

pub use dashboard::{Dashboard, EvidenceCounts};
pub use grc_hub::GrcHub;
