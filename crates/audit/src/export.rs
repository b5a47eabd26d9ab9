//! Tenant audit export with a single integrity hash over its content

use crate::evidence::{Evidence, EvidenceStore};
use crate::hashing::sha256_hex;
use crate::trail::{AuditEntry, AuditEntryDraft, AuditQuery, AuditTrail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Result, TenantId};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditExport {
    pub tenant_id: TenantId,
    pub generated_at: DateTime<Utc>,
    pub generated_by: String,
    /// Oldest first
    pub entries: Vec<AuditEntry>,
    pub evidence: Vec<Evidence>,
    pub integrity_hash: String,
}

/// Everything the integrity hash covers
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportBody<'a> {
    tenant_id: &'a TenantId,
    generated_at: &'a DateTime<Utc>,
    generated_by: &'a str,
    entries: &'a [AuditEntry],
    evidence: &'a [Evidence],
}

impl AuditExport {
    fn compute_hash(&self) -> Result<String> {
        let body = ExportBody {
            tenant_id: &self.tenant_id,
            generated_at: &self.generated_at,
            generated_by: &self.generated_by,
            entries: &self.entries,
            evidence: &self.evidence,
        };
        Ok(sha256_hex(serde_json::to_vec(&body)?))
    }
}

/// Export a tenant's audit entries and evidence.
///
/// Every exported evidence item gets an `Exported` custody record, and the
/// export itself is recorded in the trail after the snapshot is taken.
pub fn export(
    trail: &AuditTrail,
    store: &EvidenceStore,
    tenant_id: &TenantId,
    actor: &str,
) -> Result<AuditExport> {
    let entries = trail.chronological(&AuditQuery::for_tenant(tenant_id.clone()))?;
    let evidence = store.mark_exported(tenant_id, actor)?;

    let mut export = AuditExport {
        tenant_id: tenant_id.clone(),
        generated_at: Utc::now(),
        generated_by: actor.to_string(),
        entries,
        evidence,
        integrity_hash: String::new(),
    };
    export.integrity_hash = export.compute_hash()?;

    trail.record(
        AuditEntryDraft::new(tenant_id.clone(), actor, "audit.exported", "export")
            .details(serde_json::json!({
                "entries": export.entries.len(),
                "evidence": export.evidence.len(),
                "integrityHash": export.integrity_hash,
            })),
    )?;

    info!(
        tenant = %tenant_id,
        entries = export.entries.len(),
        evidence = export.evidence.len(),
        "audit export generated"
    );
    Ok(export)
}

/// Recompute the integrity hash of an export
pub fn verify_export(export: &AuditExport) -> Result<bool> {
    let valid = export.compute_hash()? == export.integrity_hash;
    if !valid {
        warn!(tenant = %export.tenant_id, "audit export integrity hash mismatch");
    }
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{CustodyAction, EvidenceDraft, EvidenceType};

    fn seeded() -> (AuditTrail, EvidenceStore, TenantId) {
        let trail = AuditTrail::new();
        let store = EvidenceStore::new();
        let tenant = TenantId::new("acme");

        trail
            .record(AuditEntryDraft::new(tenant.clone(), "alice", "control.updated", "control"))
            .unwrap();
        trail
            .record(AuditEntryDraft::new(TenantId::new("globex"), "eve", "x", "control"))
            .unwrap();
        store
            .collect(
                EvidenceDraft {
                    tenant_id: tenant.clone(),
                    control_id: "CC6.1".to_string(),
                    framework_id: None,
                    title: "MFA policy".to_string(),
                    evidence_type: EvidenceType::Document,
                    collected_by: "alice".to_string(),
                },
                b"policy text",
            )
            .unwrap();

        (trail, store, tenant)
    }

    #[test]
    fn test_export_is_tenant_scoped() {
        let (trail, store, tenant) = seeded();
        let export = export(&trail, &store, &tenant, "auditor").unwrap();

        assert_eq!(export.entries.len(), 1);
        assert_eq!(export.entries[0].actor, "alice");
        assert_eq!(export.evidence.len(), 1);
        assert_eq!(export.integrity_hash.len(), 64);
    }

    #[test]
    fn test_export_records_custody_and_audit() {
        let (trail, store, tenant) = seeded();
        let export = export(&trail, &store, &tenant, "auditor").unwrap();

        let item = &export.evidence[0];
        assert_eq!(item.last_custody().unwrap().action, CustodyAction::Exported);
        assert!(item.verify_custody());

        let recent = trail.recent(1).unwrap();
        assert_eq!(recent[0].action, "audit.exported");
        assert_eq!(
            recent[0].details.as_ref().unwrap()["integrityHash"],
            export.integrity_hash.as_str()
        );
    }

    #[test]
    fn test_verify_export() {
        let (trail, store, tenant) = seeded();
        let export = export(&trail, &store, &tenant, "auditor").unwrap();
        assert!(verify_export(&export).unwrap());

        // Survives a JSON round trip
        let json = serde_json::to_string(&export).unwrap();
        let parsed: AuditExport = serde_json::from_str(&json).unwrap();
        assert!(verify_export(&parsed).unwrap());
    }

    #[test]
    fn test_modified_export_detected() {
        let (trail, store, tenant) = seeded();
        let mut export = export(&trail, &store, &tenant, "auditor").unwrap();

        export.evidence[0].content_hash = "0".repeat(64);
        assert!(!verify_export(&export).unwrap());
    }
}
