//! # GRC Events
//!
//! Synchronous publish/subscribe with a fixed-size history ring.

mod bus;
mod event;

pub use bus::{BusStats, EventAuditSink, EventBus, EventHandler, PublishReport, SubscriptionId};
pub use event::{Event, EventType};
