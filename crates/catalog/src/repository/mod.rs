//! CatalogRepository - The persistence port for frameworks and controls
//!
//! ```text
//! Catalog               │  Adapters
//! ──────────────────────┼────────────────────────
//! trait CatalogRepo     │  InMemoryCatalog
//!   fn add_control()    │  (database-backed stores plug in here)
//! ```

pub mod in_memory;

use crate::model::control::{Control, ControlStatus};
use crate::model::framework::Framework;
use shared::Result;

/// Frameworks and controls storage
///
/// Implementations use interior mutability so one store can be shared
/// between services behind an `Arc`.
pub trait CatalogRepository: Send + Sync {
    /// Add or replace a framework
    fn add_framework(&self, framework: Framework) -> Result<()>;

    fn get_framework(&self, id: &str) -> Result<Option<Framework>>;

    /// All frameworks, ordered by id
    fn list_frameworks(&self) -> Result<Vec<Framework>>;

    /// Add or replace a control. Fails when its framework is unknown.
    fn add_control(&self, control: Control) -> Result<()>;

    fn get_control(&self, framework_id: &str, control_id: &str) -> Result<Option<Control>>;

    /// Controls of one framework, ordered by control id
    fn controls_for(&self, framework_id: &str) -> Result<Vec<Control>>;

    /// Change a control's status, returning the previous one
    fn update_status(
        &self,
        framework_id: &str,
        control_id: &str,
        status: ControlStatus,
    ) -> Result<ControlStatus>;

    /// Controls with a given status across every framework
    fn find_by_status(&self, status: ControlStatus) -> Result<Vec<Control>>;

    /// Check if a framework exists
    fn has_framework(&self, id: &str) -> Result<bool> {
        Ok(self.get_framework(id)?.is_some())
    }
}
