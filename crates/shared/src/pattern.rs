//! Topic patterns with `*` wildcards (`risk.*`, `*.collected`, `*`)

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A compiled dotted-topic pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicPattern {
    raw: String,
    /// `None` matches every topic
    regex: Option<Regex>,
}

impl TopicPattern {
    /// Compile a pattern. `*` matches any run of characters, including dots.
    pub fn new(pattern: impl Into<String>) -> crate::Result<Self> {
        let raw = pattern.into();
        if raw.trim().is_empty() {
            return Err(crate::GrcError::validation("topic pattern must not be empty"));
        }
        let escaped = regex::escape(&raw).replace(r"\*", ".*");
        let regex = Regex::new(&format!("^{}$", escaped))
            .map_err(|e| crate::GrcError::validation(format!("invalid topic pattern '{}': {}", raw, e)))?;
        Ok(Self {
            raw,
            regex: Some(regex),
        })
    }

    /// Pattern matching every topic
    pub fn any() -> Self {
        Self {
            raw: "*".to_string(),
            regex: None,
        }
    }

    pub fn matches(&self, topic: &str) -> bool {
        self.regex.as_ref().map_or(true, |r| r.is_match(topic))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl TryFrom<String> for TopicPattern {
    type Error = crate::GrcError;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::new(value)
    }
}

impl From<TopicPattern> for String {
    fn from(p: TopicPattern) -> Self {
        p.raw
    }
}

impl PartialEq for TopicPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for TopicPattern {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let p = TopicPattern::new("risk.assessed").unwrap();
        assert!(p.matches("risk.assessed"));
        assert!(!p.matches("risk.assessed.extra"));
        assert!(!p.matches("riskXassessed"));
    }

    #[test]
    fn test_wildcards() {
        let p = TopicPattern::new("risk.*").unwrap();
        assert!(p.matches("risk.assessed"));
        assert!(p.matches("risk.threshold_exceeded"));
        assert!(!p.matches("evidence.collected"));

        let suffix = TopicPattern::new("*.collected").unwrap();
        assert!(suffix.matches("evidence.collected"));

        assert!(TopicPattern::any().matches("anything.at.all"));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(TopicPattern::new("  ").is_err());
    }

    #[test]
    fn test_deserialize() {
        let p: TopicPattern = serde_json::from_str("\"webhook.*\"").unwrap();
        assert!(p.matches("webhook.slack.received"));
    }
}
