//! # GRC Audit
//!
//! Audit trail, evidence store with chain of custody, and hashed exports.

mod evidence;
mod export;
mod hashing;
mod trail;

pub use evidence::{
    CustodyAction, CustodyRecord, Evidence, EvidenceDraft, EvidenceStatus, EvidenceStore,
    EvidenceType,
};
pub use export::{export, verify_export, AuditExport};
pub use hashing::{sha256_hex, GENESIS_HASH};
pub use trail::{AuditEntry, AuditEntryDraft, AuditQuery, AuditStats, AuditTrail, ChainVerification};
