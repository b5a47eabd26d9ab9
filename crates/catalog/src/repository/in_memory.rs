//! In-Memory Catalog
//!
//! Thread-safe implementation using RwLock.

use std::collections::BTreeMap;
use std::sync::RwLock;

use shared::{GrcError, Result};
use tracing::debug;

use crate::model::control::{Control, ControlStatus};
use crate::model::framework::Framework;
use crate::repository::CatalogRepository;

#[derive(Debug, Default)]
struct CatalogState {
    frameworks: BTreeMap<String, Framework>,
    /// Keyed by `framework_id:control_id`
    controls: BTreeMap<String, Control>,
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, CatalogState>> {
        self.state.read().map_err(|_| GrcError::LockPoisoned("catalog"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, CatalogState>> {
        self.state.write().map_err(|_| GrcError::LockPoisoned("catalog"))
    }
}

fn control_key(framework_id: &str, control_id: &str) -> String {
    format!("{}:{}", framework_id, control_id)
}

impl CatalogRepository for InMemoryCatalog {
    fn add_framework(&self, framework: Framework) -> Result<()> {
        if framework.id.trim().is_empty() {
            return Err(GrcError::validation("framework id is required"));
        }
        let mut state = self.write()?;
        state.frameworks.insert(framework.id.clone(), framework);
        Ok(())
    }

    fn get_framework(&self, id: &str) -> Result<Option<Framework>> {
        Ok(self.read()?.frameworks.get(id).cloned())
    }

    fn list_frameworks(&self) -> Result<Vec<Framework>> {
        Ok(self.read()?.frameworks.values().cloned().collect())
    }

    fn add_control(&self, control: Control) -> Result<()> {
        if control.id.trim().is_empty() {
            return Err(GrcError::validation("control id is required"));
        }
        let mut state = self.write()?;
        if !state.frameworks.contains_key(&control.framework_id) {
            return Err(GrcError::not_found("Framework", control.framework_id.clone()));
        }
        debug!(control = %control.key(), "control added");
        state.controls.insert(control.key(), control);
        Ok(())
    }

    fn get_control(&self, framework_id: &str, control_id: &str) -> Result<Option<Control>> {
        Ok(self
            .read()?
            .controls
            .get(&control_key(framework_id, control_id))
            .cloned())
    }

    fn controls_for(&self, framework_id: &str) -> Result<Vec<Control>> {
        Ok(self
            .read()?
            .controls
            .values()
            .filter(|c| c.framework_id == framework_id)
            .cloned()
            .collect())
    }

    fn update_status(
        &self,
        framework_id: &str,
        control_id: &str,
        status: ControlStatus,
    ) -> Result<ControlStatus> {
        let mut state = self.write()?;
        let key = control_key(framework_id, control_id);
        let control = state
            .controls
            .get_mut(&key)
            .ok_or_else(|| GrcError::not_found("Control", key.clone()))?;

        let previous = control.status;
        control.status = status;
        control.last_tested = Some(chrono::Utc::now().to_rfc3339());
        debug!(control = %key, from = %previous, to = %status, "control status updated");
        Ok(previous)
    }

    fn find_by_status(&self, status: ControlStatus) -> Result<Vec<Control>> {
        Ok(self
            .read()?
            .controls
            .values()
            .filter(|c| c.status == status)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        catalog
            .add_framework(Framework::new("soc2", "SOC 2", "2017", "Trust services criteria"))
            .unwrap();
        catalog
    }

    #[test]
    fn test_add_and_get_control() {
        let catalog = catalog();
        catalog
            .add_control(Control::new("CC6.1", "soc2", "Logical access", "Access Control"))
            .unwrap();

        let found = catalog.get_control("soc2", "CC6.1").unwrap().unwrap();
        assert_eq!(found.title, "Logical access");
        assert!(catalog.get_control("iso27001", "CC6.1").unwrap().is_none());
    }

    #[test]
    fn test_control_requires_known_framework() {
        let catalog = catalog();
        let err = catalog
            .add_control(Control::new("A.5.1", "iso27001", "Policies", "Policy"))
            .unwrap_err();
        assert!(matches!(err, GrcError::NotFound(_)));
    }

    #[test]
    fn test_controls_for_is_ordered() {
        let catalog = catalog();
        catalog
            .add_control(Control::new("CC7.2", "soc2", "Monitoring", "Operations"))
            .unwrap();
        catalog
            .add_control(Control::new("CC6.1", "soc2", "Access", "Access Control"))
            .unwrap();

        let ids: Vec<_> = catalog
            .controls_for("soc2")
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["CC6.1", "CC7.2"]);
    }

    #[test]
    fn test_update_status() {
        let catalog = catalog();
        catalog
            .add_control(Control::new("CC6.1", "soc2", "Access", "Access Control"))
            .unwrap();

        let previous = catalog
            .update_status("soc2", "CC6.1", ControlStatus::Implemented)
            .unwrap();
        assert_eq!(previous, ControlStatus::NotImplemented);

        let control = catalog.get_control("soc2", "CC6.1").unwrap().unwrap();
        assert_eq!(control.status, ControlStatus::Implemented);
        assert!(control.last_tested.is_some());

        assert_eq!(catalog.find_by_status(ControlStatus::Implemented).unwrap().len(), 1);
        assert!(catalog
            .update_status("soc2", "missing", ControlStatus::Implemented)
            .is_err());
    }

    #[test]
    fn test_has_framework() {
        let catalog = catalog();
        assert!(catalog.has_framework("soc2").unwrap());
        assert!(!catalog.has_framework("hipaa").unwrap());
    }
}
