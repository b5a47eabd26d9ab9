//! Webhook payload → bus event

use crate::signature::WebhookProvider;
use events::Event;
use serde_json::Value;
use shared::{GrcError, Result, Severity, TenantId};
use tracing::debug;

/// Read the event kind from `type`, `event` or `event.type`
fn payload_kind(payload: &Value) -> String {
    let kind = payload
        .get("event")
        .and_then(|e| e.get("type"))
        .and_then(Value::as_str)
        .or_else(|| payload.get("type").and_then(Value::as_str))
        .or_else(|| payload.get("event").and_then(Value::as_str))
        .unwrap_or("received");

    kind.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

/// Parse a verified webhook body into an `Event`.
///
/// The tenant comes from `tenantId` in the body, falling back to
/// `default_tenant`; severity from `severity`, defaulting to `Info`.
pub fn ingest(provider: WebhookProvider, body: &[u8], default_tenant: &TenantId) -> Result<Event> {
    let payload: Value = serde_json::from_slice(body)?;
    if !payload.is_object() {
        return Err(GrcError::validation("webhook payload must be a JSON object"));
    }

    let tenant_id = payload
        .get("tenantId")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .map(TenantId::new)
        .unwrap_or_else(|| default_tenant.clone());

    let severity = payload
        .get("severity")
        .cloned()
        .and_then(|s| serde_json::from_value::<Severity>(s).ok())
        .unwrap_or(Severity::Info);

    let event_type = format!("webhook.{}.{}", provider, payload_kind(&payload));
    debug!(event_type = %event_type, tenant = %tenant_id, "webhook ingested");

    Ok(Event::new(event_type, tenant_id, format!("webhook:{}", provider))?
        .with_severity(severity)
        .with_payload(payload))
}
