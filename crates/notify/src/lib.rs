//! # GRC Notify
//!
//! Turns bus events into notifications according to configured rules and
//! hands them to delivery channels.

mod channel;
mod engine;
mod rule;

pub use channel::{NotificationChannel, RecordingChannel};
pub use engine::{Notification, NotificationEngine, NotificationStats, NotificationStatus};
pub use rule::NotificationRule;
pub use shared::ChannelKind;
