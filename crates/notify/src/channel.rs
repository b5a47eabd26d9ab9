//! Delivery channels

use crate::engine::Notification;
use shared::{ChannelKind, GrcError, Result};
use std::sync::Mutex;

/// Delivers notifications of one kind
pub trait NotificationChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Channel that keeps delivered notifications in memory.
///
/// Stands in for outbound email/Slack/webhook senders, which live outside
/// this workspace.
#[derive(Debug)]
pub struct RecordingChannel {
    kind: ChannelKind,
    sent: Mutex<Vec<Notification>>,
}

impl RecordingChannel {
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Everything delivered so far, oldest first
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl NotificationChannel for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn deliver(&self, notification: &Notification) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| GrcError::LockPoisoned("recording channel"))?
            .push(notification.clone());
        Ok(())
    }
}
