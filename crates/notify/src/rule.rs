//! NotificationRule - Which events notify whom, and how

use events::Event;
use serde::{Deserialize, Serialize};
use shared::{ChannelKind, GrcError, NotificationRuleConfig, Result, Severity, TenantId, TopicPattern};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRule {
    pub id: String,
    pub name: String,
    pub event_pattern: TopicPattern,
    pub min_severity: Severity,
    pub channels: Vec<ChannelKind>,
    pub recipients: Vec<String>,
    /// `None` applies to every tenant
    pub tenant_id: Option<TenantId>,
    pub enabled: bool,
}

impl NotificationRule {
    pub fn new(name: impl Into<String>, event_pattern: TopicPattern, recipients: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            event_pattern,
            min_severity: Severity::Info,
            channels: vec![ChannelKind::InApp],
            recipients,
            tenant_id: None,
            enabled: true,
        }
    }

    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    pub fn with_channels(mut self, channels: Vec<ChannelKind>) -> Self {
        self.channels = channels;
        self
    }

    pub fn for_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(GrcError::validation("notification rule name is required"));
        }
        if self.recipients.is_empty() {
            return Err(GrcError::validation(format!(
                "notification rule '{}' has no recipients",
                self.name
            )));
        }
        if self.channels.is_empty() {
            return Err(GrcError::validation(format!(
                "notification rule '{}' has no channels",
                self.name
            )));
        }
        Ok(())
    }

    /// Check if this rule fires for an event
    pub fn matches(&self, event: &Event) -> bool {
        if !self.enabled || event.severity < self.min_severity {
            return false;
        }
        if let Some(tenant) = &self.tenant_id {
            if tenant != &event.tenant_id {
                return false;
            }
        }
        self.event_pattern.matches(&event.event_type)
    }
}

impl From<NotificationRuleConfig> for NotificationRule {
    fn from(config: NotificationRuleConfig) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: config.name,
            event_pattern: config.event_pattern,
            min_severity: config.min_severity,
            channels: config.channels,
            recipients: config.recipients,
            tenant_id: config.tenant_id.map(TenantId::new),
            enabled: config.enabled,
        }
    }
}
