//! Starter catalog: four frameworks with representative controls

use crate::model::control::{Control, ControlStatus};
use crate::model::framework::Framework;
use crate::repository::CatalogRepository;
use shared::Result;
use tracing::info;

use ControlStatus::*;

const FRAMEWORKS: &[(&str, &str, &str, &str)] = &[
    ("soc2", "SOC 2", "2017", "AICPA Trust Services Criteria for security, availability and confidentiality"),
    ("iso27001", "ISO 27001", "2022", "Information security management systems"),
    ("nist-csf", "NIST CSF", "2.0", "NIST Cybersecurity Framework"),
    ("gdpr", "GDPR", "2016/679", "EU General Data Protection Regulation"),
];

/// (framework, control id, title, category, status, owner)
const CONTROLS: &[(&str, &str, &str, &str, ControlStatus, &str)] = &[
    ("soc2", "CC1.1", "Integrity and ethical values", "Control Environment", Implemented, "hr"),
    ("soc2", "CC6.1", "Logical access security", "Access Control", Implemented, "security"),
    ("soc2", "CC6.2", "User registration and authorization", "Access Control", PartiallyImplemented, "it"),
    ("soc2", "CC7.2", "System monitoring", "System Operations", PartiallyImplemented, "security"),
    ("soc2", "CC8.1", "Change management", "Change Management", NotImplemented, "engineering"),
    ("iso27001", "A.5.1", "Policies for information security", "Organizational", Implemented, "ciso"),
    ("iso27001", "A.5.15", "Access control", "Organizational", Implemented, "security"),
    ("iso27001", "A.8.7", "Protection against malware", "Technological", PartiallyImplemented, "it"),
    ("iso27001", "A.8.13", "Information backup", "Technological", NotImplemented, "it"),
    ("iso27001", "A.7.4", "Physical security monitoring", "Physical", NotApplicable, "facilities"),
    ("nist-csf", "GV.OC-01", "Organizational mission understood", "Govern", Implemented, "ciso"),
    ("nist-csf", "ID.AM-01", "Hardware inventory maintained", "Identify", PartiallyImplemented, "it"),
    ("nist-csf", "PR.AA-01", "Identities and credentials managed", "Protect", Implemented, "security"),
    ("nist-csf", "DE.CM-01", "Networks monitored", "Detect", NotImplemented, "security"),
    ("nist-csf", "RS.MA-01", "Incident response plan executed", "Respond", PartiallyImplemented, "security"),
    ("gdpr", "Art.5", "Principles of processing", "Principles", Implemented, "dpo"),
    ("gdpr", "Art.30", "Records of processing activities", "Accountability", PartiallyImplemented, "dpo"),
    ("gdpr", "Art.32", "Security of processing", "Security", Implemented, "security"),
    ("gdpr", "Art.33", "Breach notification", "Security", NotImplemented, "dpo"),
];

/// Load the starter frameworks and controls into a repository
pub fn seed(repo: &dyn CatalogRepository) -> Result<()> {
    for (id, name, version, description) in FRAMEWORKS {
        repo.add_framework(Framework::new(*id, *name, *version, *description))?;
    }
    for (framework_id, id, title, category, status, owner) in CONTROLS {
        repo.add_control(
            Control::new(*id, *framework_id, *title, *category)
                .with_status(*status)
                .with_owner(*owner),
        )?;
    }
    info!(
        frameworks = FRAMEWORKS.len(),
        controls = CONTROLS.len(),
        "catalog seeded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::compliance_score;
    use crate::repository::in_memory::InMemoryCatalog;

    #[test]
    fn test_seed_loads_all_frameworks() {
        let catalog = InMemoryCatalog::new();
        seed(&catalog).unwrap();

        let ids: Vec<_> = catalog
            .list_frameworks()
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["gdpr", "iso27001", "nist-csf", "soc2"]);
        assert_eq!(catalog.controls_for("soc2").unwrap().len(), 5);
    }

    #[test]
    fn test_seeded_scores() {
        let catalog = InMemoryCatalog::new();
        seed(&catalog).unwrap();

        // 2 implemented + 2 partial of 5 applicable
        let soc2 = compliance_score(&catalog, "soc2").unwrap();
        assert!((soc2.score - 60.0).abs() < 1e-9);

        // A.7.4 is not applicable: 2 + 0.5 of 4
        let iso = compliance_score(&catalog, "iso27001").unwrap();
        assert!((iso.score - 62.5).abs() < 1e-9);
    }
}
