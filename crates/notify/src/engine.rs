//! NotificationEngine - Rule evaluation and delivery
//!
//! In-app notifications are stored in the engine's inbox and count as
//! delivered. Other channels go through registered `NotificationChannel`s;
//! a missing or failing channel marks the notification `Failed` and is
//! never propagated to the publisher.

use crate::channel::NotificationChannel;
use crate::rule::NotificationRule;
use events::{Event, EventHandler};
use serde::{Deserialize, Serialize};
use shared::{ChannelKind, GrcError, Result, Severity, TenantId};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Default cap on stored notifications
const DEFAULT_MAX_NOTIFICATIONS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Delivered,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub rule_id: String,
    pub tenant_id: TenantId,
    pub recipient: String,
    pub channel: ChannelKind,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub event_id: String,
    pub event_type: String,
    pub created_at: String,
    pub status: NotificationStatus,
    pub error: Option<String>,
    pub read: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    pub total: usize,
    pub delivered: usize,
    pub failed: usize,
    pub unread: usize,
    pub rules: usize,
}

pub struct NotificationEngine {
    rules: RwLock<Vec<NotificationRule>>,
    inbox: RwLock<VecDeque<Notification>>,
    channels: RwLock<HashMap<ChannelKind, Arc<dyn NotificationChannel>>>,
    max_notifications: usize,
}

impl NotificationEngine {
    pub fn new(max_notifications: usize) -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            inbox: RwLock::new(VecDeque::new()),
            channels: RwLock::new(HashMap::new()),
            max_notifications: max_notifications.max(1),
        }
    }

    pub fn add_rule(&self, rule: NotificationRule) -> Result<String> {
        rule.validate()?;
        let id = rule.id.clone();
        self.rules
            .write()
            .map_err(|_| GrcError::LockPoisoned("notification rules"))?
            .push(rule);
        Ok(id)
    }

    pub fn remove_rule(&self, rule_id: &str) -> Result<bool> {
        let mut rules = self
            .rules
            .write()
            .map_err(|_| GrcError::LockPoisoned("notification rules"))?;
        let before = rules.len();
        rules.retain(|r| r.id != rule_id);
        Ok(rules.len() != before)
    }

    pub fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> Result<()> {
        let mut rules = self
            .rules
            .write()
            .map_err(|_| GrcError::LockPoisoned("notification rules"))?;
        let rule = rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| GrcError::not_found("NotificationRule", rule_id))?;
        rule.enabled = enabled;
        Ok(())
    }

    pub fn rules(&self) -> Result<Vec<NotificationRule>> {
        Ok(self
            .rules
            .read()
            .map_err(|_| GrcError::LockPoisoned("notification rules"))?
            .clone())
    }

    /// Register the sender for one channel kind, replacing any previous one
    pub fn register_channel(&self, channel: Arc<dyn NotificationChannel>) -> Result<()> {
        self.channels
            .write()
            .map_err(|_| GrcError::LockPoisoned("notification channels"))?
            .insert(channel.kind(), channel);
        Ok(())
    }

    /// Create and deliver notifications for every rule matching the event
    pub fn evaluate(&self, event: &Event) -> Result<Vec<Notification>> {
        let matched: Vec<NotificationRule> = self
            .rules
            .read()
            .map_err(|_| GrcError::LockPoisoned("notification rules"))?
            .iter()
            .filter(|r| r.matches(event))
            .cloned()
            .collect();

        if matched.is_empty() {
            return Ok(Vec::new());
        }

        let channels = self
            .channels
            .read()
            .map_err(|_| GrcError::LockPoisoned("notification channels"))?
            .clone();

        let (title, message) = render(event);
        let mut created = Vec::new();

        for rule in &matched {
            for recipient in &rule.recipients {
                for channel in &rule.channels {
                    let mut notification = Notification {
                        id: uuid::Uuid::new_v4().to_string(),
                        rule_id: rule.id.clone(),
                        tenant_id: event.tenant_id.clone(),
                        recipient: recipient.clone(),
                        channel: *channel,
                        title: title.clone(),
                        message: message.clone(),
                        severity: event.severity,
                        event_id: event.id.clone(),
                        event_type: event.event_type.clone(),
                        created_at: chrono::Utc::now().to_rfc3339(),
                        status: NotificationStatus::Delivered,
                        error: None,
                        read: false,
                    };
                    deliver(&channels, &mut notification);
                    created.push(notification);
                }
            }
        }

        let mut inbox = self
            .inbox
            .write()
            .map_err(|_| GrcError::LockPoisoned("notification inbox"))?;
        for notification in &created {
            if inbox.len() >= self.max_notifications {
                inbox.pop_front();
            }
            inbox.push_back(notification.clone());
        }

        debug!(
            event_type = %event.event_type,
            rules = matched.len(),
            notifications = created.len(),
            "notifications created"
        );
        Ok(created)
    }

    /// Unread in-app notifications for a recipient, newest first
    pub fn unread_for(&self, recipient: &str) -> Result<Vec<Notification>> {
        let inbox = self.read_inbox()?;
        Ok(inbox
            .iter()
            .rev()
            .filter(|n| n.channel == ChannelKind::InApp && n.recipient == recipient && !n.read)
            .cloned()
            .collect())
    }

    /// Every stored notification of a tenant, newest first
    pub fn for_tenant(&self, tenant_id: &TenantId) -> Result<Vec<Notification>> {
        let inbox = self.read_inbox()?;
        Ok(inbox
            .iter()
            .rev()
            .filter(|n| &n.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    pub fn mark_read(&self, id: &str) -> Result<()> {
        let mut inbox = self.write_inbox()?;
        let notification = inbox
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| GrcError::not_found("Notification", id))?;
        notification.read = true;
        Ok(())
    }

    /// Mark a recipient's in-app inbox as read, returning how many changed
    pub fn mark_all_read(&self, recipient: &str) -> Result<usize> {
        let mut inbox = self.write_inbox()?;
        let mut changed = 0;
        for notification in inbox
            .iter_mut()
            .filter(|n| n.channel == ChannelKind::InApp && n.recipient == recipient && !n.read)
        {
            notification.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    pub fn stats(&self) -> Result<NotificationStats> {
        let inbox = self.read_inbox()?;
        let rules = self
            .rules
            .read()
            .map_err(|_| GrcError::LockPoisoned("notification rules"))?
            .len();
        Ok(NotificationStats {
            total: inbox.len(),
            delivered: inbox
                .iter()
                .filter(|n| n.status == NotificationStatus::Delivered)
                .count(),
            failed: inbox
                .iter()
                .filter(|n| n.status == NotificationStatus::Failed)
                .count(),
            unread: inbox
                .iter()
                .filter(|n| n.channel == ChannelKind::InApp && !n.read)
                .count(),
            rules,
        })
    }

    fn read_inbox(&self) -> Result<std::sync::RwLockReadGuard<'_, VecDeque<Notification>>> {
        self.inbox
            .read()
            .map_err(|_| GrcError::LockPoisoned("notification inbox"))
    }

    fn write_inbox(&self) -> Result<std::sync::RwLockWriteGuard<'_, VecDeque<Notification>>> {
        self.inbox
            .write()
            .map_err(|_| GrcError::LockPoisoned("notification inbox"))
    }
}

fn deliver(
    channels: &HashMap<ChannelKind, Arc<dyn NotificationChannel>>,
    notification: &mut Notification,
) {
    if notification.channel == ChannelKind::InApp {
        return;
    }

    let result = match channels.get(&notification.channel) {
        Some(channel) => channel.deliver(notification),
        None => Err(GrcError::Config(format!(
            "no {:?} channel registered",
            notification.channel
        ))),
    };

    if let Err(e) = result {
        warn!(
            notification_id = %notification.id,
            channel = ?notification.channel,
            recipient = %notification.recipient,
            error = %e,
            "notification delivery failed"
        );
        notification.status = NotificationStatus::Failed;
        notification.error = Some(e.to_string());
    }
}

/// Title and body for an event; a string `message` in the payload wins
fn render(event: &Event) -> (String, String) {
    let title = format!(
        "[{}] {}",
        event.severity.as_str().to_uppercase(),
        event.event_type
    );
    let message = match event.payload.get("message").and_then(|m| m.as_str()) {
        Some(message) => message.to_string(),
        None => format!(
            "{} from {} for tenant {}",
            event.event_type, event.source, event.tenant_id
        ),
    };
    (title, message)
}

impl Default for NotificationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NOTIFICATIONS)
    }
}

impl EventHandler for NotificationEngine {
    fn handle(&self, event: &Event) -> Result<()> {
        self.evaluate(event).map(|_| ())
    }
}

impl fmt::Debug for NotificationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationEngine")
            .field("max_notifications", &self.max_notifications)
            .finish_non_exhaustive()
    }
}
