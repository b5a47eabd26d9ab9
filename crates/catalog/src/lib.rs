//! # GRC Catalog
//!
//! Compliance frameworks and their controls.
//!
//! ```text
//! model/       - Framework, Control, ControlStatus
//! repository/  - CatalogRepository port + in-memory adapter
//! compliance   - per-framework compliance scoring
//! seed         - SOC 2 / ISO 27001 / NIST CSF / GDPR starter data
//! ```

pub mod compliance;
pub mod model;
pub mod repository;
pub mod seed;

pub use compliance::{compliance_score, ComplianceScore};
pub use model::{
    control::{Control, ControlStatus},
    framework::Framework,
};
pub use repository::{in_memory::InMemoryCatalog, CatalogRepository};
