//! Event records carried by the bus

use serde::{Deserialize, Serialize};
use shared::{GrcError, Result, Severity, TenantId};

/// Well-known event topics published by the platform services
pub struct EventType;

impl EventType {
    pub const RISK_ASSESSED: &'static str = "risk.assessed";
    pub const RISK_THRESHOLD_EXCEEDED: &'static str = "risk.threshold_exceeded";
    pub const EVIDENCE_COLLECTED: &'static str = "evidence.collected";
    pub const EVIDENCE_REVIEWED: &'static str = "evidence.reviewed";
    pub const CONTROL_STATUS_CHANGED: &'static str = "control.status_changed";
    pub const AUDIT_EXPORTED: &'static str = "audit.exported";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub event_type: String,
    pub tenant_id: TenantId,
    /// Service or integration that emitted the event
    pub source: String,
    pub severity: Severity,
    pub payload: serde_json::Value,
    pub timestamp: String,
}

impl Event {
    /// Create an event with an empty payload and `Info` severity
    pub fn new(
        event_type: impl Into<String>,
        tenant_id: TenantId,
        source: impl Into<String>,
    ) -> Result<Self> {
        let event_type = event_type.into();
        if event_type.trim().is_empty() {
            return Err(GrcError::validation("event type is required"));
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            tenant_id,
            source: source.into(),
            severity: Severity::Info,
            payload: serde_json::Value::Null,
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
