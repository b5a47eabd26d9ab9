//! EvidenceStore - Evidence items with content hashes and chain of custody
//!
//! Custody logs are append-only. Each record hashes its own fields together
//! with the hash of the record before it.

use crate::hashing::{sha256_hex, GENESIS_HASH};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{GrcError, InvalidTransitionError, Result, TenantId};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Screenshot,
    Document,
    Attestation,
    AutomatedCheck,
}

impl EvidenceType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "screenshot" => Some(EvidenceType::Screenshot),
            "document" => Some(EvidenceType::Document),
            "attestation" => Some(EvidenceType::Attestation),
            "automated_check" | "automated-check" => Some(EvidenceType::AutomatedCheck),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for EvidenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EvidenceStatus::Pending => "pending",
            EvidenceStatus::Approved => "approved",
            EvidenceStatus::Rejected => "rejected",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustodyAction {
    Collected,
    Viewed,
    Transferred,
    Verified,
    Approved,
    Rejected,
    Exported,
}

impl fmt::Display for CustodyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CustodyAction::Collected => "collected",
            CustodyAction::Viewed => "viewed",
            CustodyAction::Transferred => "transferred",
            CustodyAction::Verified => "verified",
            CustodyAction::Approved => "approved",
            CustodyAction::Rejected => "rejected",
            CustodyAction::Exported => "exported",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustodyRecord {
    pub sequence: u32,
    pub action: CustodyAction,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
    pub previous_hash: String,
    pub hash: String,
}

impl CustodyRecord {
    fn new(
        evidence_id: &str,
        previous: Option<&CustodyRecord>,
        action: CustodyAction,
        actor: &str,
        notes: Option<String>,
    ) -> Self {
        let mut record = Self {
            sequence: previous.map(|p| p.sequence + 1).unwrap_or(1),
            action,
            actor: actor.to_string(),
            timestamp: Utc::now(),
            notes,
            previous_hash: previous
                .map(|p| p.hash.clone())
                .unwrap_or_else(|| GENESIS_HASH.to_string()),
            hash: String::new(),
        };
        record.hash = record.compute_hash(evidence_id);
        record
    }

    pub fn compute_hash(&self, evidence_id: &str) -> String {
        sha256_hex(
            serde_json::json!([
                evidence_id,
                self.sequence,
                self.action,
                self.actor,
                self.timestamp.to_rfc3339(),
                self.notes,
                self.previous_hash,
            ])
            .to_string(),
        )
    }
}

/// An evidence item backing a control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub id: String,
    pub tenant_id: TenantId,
    pub control_id: String,
    pub framework_id: Option<String>,
    pub title: String,
    pub evidence_type: EvidenceType,
    pub content_hash: String,
    pub size_bytes: usize,
    pub collected_by: String,
    pub collected_at: DateTime<Utc>,
    pub status: EvidenceStatus,
    pub custody: Vec<CustodyRecord>,
}

impl Evidence {
    /// Check every custody record against its hash and predecessor
    pub fn verify_custody(&self) -> bool {
        let mut expected_previous = GENESIS_HASH;
        for (i, record) in self.custody.iter().enumerate() {
            if record.sequence as usize != i + 1
                || record.previous_hash != expected_previous
                || record.compute_hash(&self.id) != record.hash
            {
                return false;
            }
            expected_previous = record.hash.as_str();
        }
        true
    }

    pub fn last_custody(&self) -> Option<&CustodyRecord> {
        self.custody.last()
    }
}

/// Caller-supplied metadata for `EvidenceStore::collect`
#[derive(Debug, Clone)]
pub struct EvidenceDraft {
    pub tenant_id: TenantId,
    pub control_id: String,
    pub framework_id: Option<String>,
    pub title: String,
    pub evidence_type: EvidenceType,
    pub collected_by: String,
}

/// In-memory evidence store
#[derive(Debug, Default)]
pub struct EvidenceStore {
    items: RwLock<HashMap<String, Evidence>>,
}

impl EvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash the content and store a new evidence item in `Pending` state
    pub fn collect(&self, draft: EvidenceDraft, content: &[u8]) -> Result<Evidence> {
        if draft.title.trim().is_empty() {
            return Err(GrcError::validation("evidence title is required"));
        }
        if draft.control_id.trim().is_empty() {
            return Err(GrcError::validation("evidence must reference a control"));
        }
        if draft.collected_by.trim().is_empty() {
            return Err(GrcError::validation("evidence collector is required"));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let custody = CustodyRecord::new(
            &id,
            None,
            CustodyAction::Collected,
            &draft.collected_by,
            None,
        );

        let evidence = Evidence {
            id: id.clone(),
            tenant_id: draft.tenant_id,
            control_id: draft.control_id,
            framework_id: draft.framework_id,
            title: draft.title,
            evidence_type: draft.evidence_type,
            content_hash: sha256_hex(content),
            size_bytes: content.len(),
            collected_by: draft.collected_by,
            collected_at: custody.timestamp,
            status: EvidenceStatus::Pending,
            custody: vec![custody],
        };

        debug!(
            evidence_id = %evidence.id,
            control = %evidence.control_id,
            hash = %evidence.content_hash,
            "evidence collected"
        );

        let mut items = self.write_items()?;
        items.insert(id, evidence.clone());
        Ok(evidence)
    }

    pub fn get(&self, id: &str) -> Result<Option<Evidence>> {
        Ok(self.read_items()?.get(id).cloned())
    }

    /// Append a custody record
    pub fn record_custody(
        &self,
        id: &str,
        action: CustodyAction,
        actor: &str,
        notes: Option<&str>,
    ) -> Result<CustodyRecord> {
        if actor.trim().is_empty() {
            return Err(GrcError::validation("custody actor is required"));
        }
        let mut items = self.write_items()?;
        let evidence = items
            .get_mut(id)
            .ok_or_else(|| GrcError::not_found("Evidence", id))?;
        Ok(append_custody(evidence, action, actor, notes.map(|s| s.to_string())))
    }

    /// Recompute the content hash and compare. The check itself is logged
    /// in the custody chain.
    pub fn verify_content(&self, id: &str, content: &[u8], actor: &str) -> Result<bool> {
        let mut items = self.write_items()?;
        let evidence = items
            .get_mut(id)
            .ok_or_else(|| GrcError::not_found("Evidence", id))?;

        let matches = sha256_hex(content) == evidence.content_hash;
        if !matches {
            warn!(evidence_id = id, "evidence content hash mismatch");
        }
        let notes = if matches { "hash match" } else { "hash mismatch" };
        append_custody(evidence, CustodyAction::Verified, actor, Some(notes.to_string()));
        Ok(matches)
    }

    /// Approve or reject a pending item
    pub fn review(
        &self,
        id: &str,
        approve: bool,
        reviewer: &str,
        notes: Option<&str>,
    ) -> Result<Evidence> {
        if reviewer.trim().is_empty() {
            return Err(GrcError::validation("reviewer is required"));
        }
        let mut items = self.write_items()?;
        let evidence = items
            .get_mut(id)
            .ok_or_else(|| GrcError::not_found("Evidence", id))?;

        let (status, action) = if approve {
            (EvidenceStatus::Approved, CustodyAction::Approved)
        } else {
            (EvidenceStatus::Rejected, CustodyAction::Rejected)
        };

        if evidence.status != EvidenceStatus::Pending {
            return Err(InvalidTransitionError {
                kind: "Evidence",
                id: id.to_string(),
                from: evidence.status.to_string(),
                to: status.to_string(),
            }
            .into());
        }

        evidence.status = status;
        append_custody(evidence, action, reviewer, notes.map(|s| s.to_string()));
        Ok(evidence.clone())
    }

    /// All items of a tenant, oldest first
    pub fn list(&self, tenant_id: &TenantId) -> Result<Vec<Evidence>> {
        self.filter(|e| &e.tenant_id == tenant_id)
    }

    pub fn by_control(&self, tenant_id: &TenantId, control_id: &str) -> Result<Vec<Evidence>> {
        self.filter(|e| &e.tenant_id == tenant_id && e.control_id == control_id)
    }

    pub fn by_type(&self, tenant_id: &TenantId, evidence_type: EvidenceType) -> Result<Vec<Evidence>> {
        self.filter(|e| &e.tenant_id == tenant_id && e.evidence_type == evidence_type)
    }

    pub fn by_status(&self, tenant_id: &TenantId, status: EvidenceStatus) -> Result<Vec<Evidence>> {
        self.filter(|e| &e.tenant_id == tenant_id && e.status == status)
    }

    /// Append `Exported` to every item of the tenant and return the updated items
    pub(crate) fn mark_exported(&self, tenant_id: &TenantId, actor: &str) -> Result<Vec<Evidence>> {
        let mut items = self.write_items()?;
        let mut exported: Vec<Evidence> = items
            .values_mut()
            .filter(|e| &e.tenant_id == tenant_id)
            .map(|e| {
                append_custody(e, CustodyAction::Exported, actor, None);
                e.clone()
            })
            .collect();
        exported.sort_by(|a, b| a.collected_at.cmp(&b.collected_at).then_with(|| a.id.cmp(&b.id)));
        Ok(exported)
    }

    fn filter(&self, predicate: impl Fn(&Evidence) -> bool) -> Result<Vec<Evidence>> {
        let items = self.read_items()?;
        let mut list: Vec<Evidence> = items.values().filter(|e| predicate(e)).cloned().collect();
        list.sort_by(|a, b| a.collected_at.cmp(&b.collected_at).then_with(|| a.id.cmp(&b.id)));
        Ok(list)
    }

    fn read_items(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Evidence>>> {
        self.items.read().map_err(|_| GrcError::LockPoisoned("evidence store"))
    }

    fn write_items(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Evidence>>> {
        self.items.write().map_err(|_| GrcError::LockPoisoned("evidence store"))
    }
}

fn append_custody(
    evidence: &mut Evidence,
    action: CustodyAction,
    actor: &str,
    notes: Option<String>,
) -> CustodyRecord {
    let record = CustodyRecord::new(&evidence.id, evidence.custody.last(), action, actor, notes);
    debug!(evidence_id = %evidence.id, action = %action, actor, "custody recorded");
    evidence.custody.push(record.clone());
    record
}
