//! AuditTrail - Hash-chained audit log
//!
//! Entries live in a map keyed by id. Each entry stores the SHA-256 of its
//! canonical form and the hash of the entry before it, so rewriting any
//! entry or reordering the log breaks `verify_chain`.

use crate::hashing::{sha256_hex, GENESIS_HASH};
use chrono::{DateTime, Utc};
use events::{Event, EventAuditSink};
use serde::{Deserialize, Serialize};
use shared::{GrcError, Result, TenantId};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, warn};

/// Audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub tenant_id: TenantId,
    pub actor: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub success: bool,
    pub details: Option<serde_json::Value>,
    pub previous_hash: String,
    pub hash: String,
}

impl AuditEntry {
    /// JSON array of the hashed fields; quoting keeps field boundaries fixed
    fn canonical(&self) -> String {
        serde_json::json!([
            self.sequence,
            self.id,
            self.timestamp.to_rfc3339(),
            self.tenant_id,
            self.actor,
            self.action,
            self.resource_type,
            self.resource_id,
            self.success,
            self.details,
            self.previous_hash,
        ])
        .to_string()
    }

    /// Recompute this entry's hash from its fields
    pub fn compute_hash(&self) -> String {
        sha256_hex(self.canonical())
    }
}

/// Fields supplied by the caller when recording an entry
#[derive(Debug, Clone)]
pub struct AuditEntryDraft {
    pub tenant_id: TenantId,
    pub actor: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub success: bool,
    pub details: Option<serde_json::Value>,
}

impl AuditEntryDraft {
    pub fn new(
        tenant_id: TenantId,
        actor: impl Into<String>,
        action: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            actor: actor.into(),
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            success: true,
            details: None,
        }
    }

    pub fn resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn failed(mut self) -> Self {
        self.success = false;
        self
    }
}

/// Filter for `AuditTrail::query`; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub tenant_id: Option<TenantId>,
    pub actor: Option<String>,
    /// Exact action, or a prefix when it ends with `*`
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl AuditQuery {
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            ..Default::default()
        }
    }

    fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(tenant) = &self.tenant_id {
            if &entry.tenant_id != tenant {
                return false;
            }
        }
        if let Some(actor) = &self.actor {
            if &entry.actor != actor {
                return false;
            }
        }
        if let Some(action) = &self.action {
            let ok = match action.strip_suffix('*') {
                Some(prefix) => entry.action.starts_with(prefix),
                None => &entry.action == action,
            };
            if !ok {
                return false;
            }
        }
        if let Some(resource_type) = &self.resource_type {
            if &entry.resource_type != resource_type {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.timestamp > until {
                return false;
            }
        }
        true
    }
}

/// Audit statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total_entries: usize,
    pub failure_count: usize,
    pub by_action: HashMap<String, usize>,
}

/// Result of walking the hash chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainVerification {
    pub valid: bool,
    pub checked: usize,
    /// First entry whose hash or link does not match
    pub first_invalid: Option<String>,
}

#[derive(Debug, Default)]
struct TrailState {
    entries: HashMap<String, AuditEntry>,
    /// Entry ids in append order
    order: Vec<String>,
}

/// Audit trail
#[derive(Debug, Default)]
pub struct AuditTrail {
    state: RwLock<TrailState>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, linking it to the current chain head
    pub fn record(&self, draft: AuditEntryDraft) -> Result<AuditEntry> {
        if draft.actor.trim().is_empty() {
            return Err(GrcError::validation("audit actor is required"));
        }
        if draft.action.trim().is_empty() {
            return Err(GrcError::validation("audit action is required"));
        }

        let mut state = self.write_state()?;
        let previous_hash = state
            .order
            .last()
            .and_then(|id| state.entries.get(id))
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());

        let mut entry = AuditEntry {
            id: uuid::Uuid::new_v4().to_string(),
            sequence: state.order.len() as u64 + 1,
            timestamp: Utc::now(),
            tenant_id: draft.tenant_id,
            actor: draft.actor,
            action: draft.action,
            resource_type: draft.resource_type,
            resource_id: draft.resource_id,
            success: draft.success,
            details: draft.details,
            previous_hash,
            hash: String::new(),
        };
        entry.hash = entry.compute_hash();

        debug!(
            entry_id = %entry.id,
            tenant = %entry.tenant_id,
            action = %entry.action,
            "audit entry recorded"
        );

        state.order.push(entry.id.clone());
        state.entries.insert(entry.id.clone(), entry.clone());
        Ok(entry)
    }

    pub fn get(&self, id: &str) -> Result<Option<AuditEntry>> {
        Ok(self.read_state()?.entries.get(id).cloned())
    }

    /// Matching entries, newest first
    pub fn query(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        let state = self.read_state()?;
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(state
            .order
            .iter()
            .rev()
            .filter_map(|id| state.entries.get(id))
            .filter(|e| query.matches(e))
            .take(limit)
            .cloned()
            .collect())
    }

    /// Matching entries, oldest first
    pub fn chronological(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        let mut entries = self.query(query)?;
        entries.reverse();
        Ok(entries)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<AuditEntry>> {
        self.query(&AuditQuery {
            limit: Some(limit),
            ..Default::default()
        })
    }

    pub fn stats(&self) -> Result<AuditStats> {
        let state = self.read_state()?;
        let mut by_action = HashMap::new();
        for entry in state.entries.values() {
            *by_action.entry(entry.action.clone()).or_insert(0) += 1;
        }
        Ok(AuditStats {
            total_entries: state.entries.len(),
            failure_count: state.entries.values().filter(|e| !e.success).count(),
            by_action,
        })
    }

    pub fn len(&self) -> usize {
        self.read_state().map(|s| s.order.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walk the whole chain recomputing every hash and link
    pub fn verify_chain(&self) -> Result<ChainVerification> {
        let state = self.read_state()?;
        let mut expected_previous = GENESIS_HASH.to_string();
        let mut checked = 0;

        for id in &state.order {
            let entry = match state.entries.get(id) {
                Some(e) => e,
                None => {
                    return Ok(ChainVerification {
                        valid: false,
                        checked,
                        first_invalid: Some(id.clone()),
                    })
                }
            };
            checked += 1;

            if entry.previous_hash != expected_previous || entry.compute_hash() != entry.hash {
                warn!(entry_id = %entry.id, sequence = entry.sequence, "audit chain broken");
                return Ok(ChainVerification {
                    valid: false,
                    checked,
                    first_invalid: Some(entry.id.clone()),
                });
            }
            expected_previous = entry.hash.clone();
        }

        Ok(ChainVerification {
            valid: true,
            checked,
            first_invalid: None,
        })
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, TrailState>> {
        self.state.read().map_err(|_| GrcError::LockPoisoned("audit trail"))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, TrailState>> {
        self.state.write().map_err(|_| GrcError::LockPoisoned("audit trail"))
    }
}

impl EventAuditSink for AuditTrail {
    fn record_event(&self, event: &Event) -> Result<()> {
        self.record(
            AuditEntryDraft::new(
                event.tenant_id.clone(),
                event.source.clone(),
                "event.published",
                "event",
            )
            .resource(event.id.clone())
            .details(serde_json::json!({
                "eventType": event.event_type,
                "severity": event.severity,
            })),
        )
        .map(|_| ())
    }
}
