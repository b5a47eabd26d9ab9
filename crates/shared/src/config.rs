//! Configuration types for GRC

use crate::{GrcError, Severity, TopicPattern};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default number of events kept in the bus history
pub const DEFAULT_EVENT_HISTORY: usize = 50;

/// Default tolerance for signed webhook timestamps
pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Delivery channel for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    InApp,
    Email,
    Slack,
    Webhook,
}

/// Notification rule as written in a config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRuleConfig {
    pub name: String,

    /// Event topic pattern, e.g. `risk.*`
    pub event_pattern: TopicPattern,

    #[serde(default)]
    pub min_severity: Severity,

    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelKind>,

    pub recipients: Vec<String>,

    /// Restrict the rule to one tenant
    #[serde(default)]
    pub tenant_id: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_channels() -> Vec<ChannelKind> {
    vec![ChannelKind::InApp]
}

fn default_enabled() -> bool {
    true
}

/// Top-level configuration (`grc.json` / `grc.yaml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrcConfig {
    /// Ring buffer size of the event bus
    #[serde(default = "default_event_history")]
    pub event_history_capacity: usize,

    /// Allowed clock skew for timestamped webhook signatures
    #[serde(default = "default_webhook_tolerance")]
    pub webhook_tolerance_secs: i64,

    /// Shared secrets keyed by provider name (`slack`, `airtable`, `generic`)
    #[serde(default)]
    pub webhook_secrets: HashMap<String, String>,

    #[serde(default)]
    pub notification_rules: Vec<NotificationRuleConfig>,
}

fn default_event_history() -> usize {
    DEFAULT_EVENT_HISTORY
}

fn default_webhook_tolerance() -> i64 {
    DEFAULT_WEBHOOK_TOLERANCE_SECS
}

impl Default for GrcConfig {
    fn default() -> Self {
        Self {
            event_history_capacity: DEFAULT_EVENT_HISTORY,
            webhook_tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
            webhook_secrets: HashMap::new(),
            notification_rules: Vec::new(),
        }
    }
}

impl GrcConfig {
    /// Load configuration from a JSON or YAML file, picked by extension
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.event_history_capacity == 0 {
            return Err(GrcError::Config("eventHistoryCapacity must be at least 1".to_string()));
        }
        if self.webhook_tolerance_secs < 0 {
            return Err(GrcError::Config("webhookToleranceSecs must not be negative".to_string()));
        }
        for rule in &self.notification_rules {
            if rule.recipients.is_empty() {
                return Err(GrcError::Config(format!(
                    "notification rule '{}' has no recipients",
                    rule.name
                )));
            }
        }
        Ok(())
    }

    /// Secret configured for a webhook provider
    pub fn webhook_secret(&self, provider: &str) -> Option<&str> {
        self.webhook_secrets.get(provider).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GrcConfig::default();
        assert_eq!(config.event_history_capacity, 50);
        assert_eq!(config.webhook_tolerance_secs, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_json() {
        let json = r#"{
            "eventHistoryCapacity": 10,
            "webhookSecrets": { "slack": "s3cr3t" },
            "notificationRules": [
                {
                    "name": "risk alerts",
                    "eventPattern": "risk.*",
                    "minSeverity": "high",
                    "recipients": ["ciso@example.com"]
                }
            ]
        }"#;

        let config: GrcConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.event_history_capacity, 10);
        assert_eq!(config.webhook_tolerance_secs, 300);
        assert_eq!(config.webhook_secret("slack"), Some("s3cr3t"));

        let rule = &config.notification_rules[0];
        assert_eq!(rule.min_severity, Severity::High);
        assert_eq!(rule.channels, vec![ChannelKind::InApp]);
        assert!(rule.enabled);
        assert!(rule.event_pattern.matches("risk.assessed"));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "eventHistoryCapacity: 5\nwebhookSecrets:\n  generic: abc\n"
        )
        .unwrap();

        let config = GrcConfig::from_file(file.path()).unwrap();
        assert_eq!(config.event_history_capacity, 5);
        assert_eq!(config.webhook_secret("generic"), Some("abc"));
    }

    #[test]
    fn test_from_file_rejects_zero_capacity() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"eventHistoryCapacity": 0}}"#).unwrap();

        let err = GrcConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, GrcError::Config(_)));
    }

    #[test]
    fn test_rule_without_recipients_rejected() {
        let mut config = GrcConfig::default();
        config.notification_rules.push(NotificationRuleConfig {
            name: "empty".to_string(),
            event_pattern: TopicPattern::any(),
            min_severity: Severity::Info,
            channels: default_channels(),
            recipients: vec![],
            tenant_id: None,
            enabled: true,
        });
        assert!(config.validate().is_err());
    }
}
