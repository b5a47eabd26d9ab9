//! Control - A requirement within a framework and its implementation state

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    Implemented,
    PartiallyImplemented,
    NotImplemented,
    NotApplicable,
}

impl ControlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlStatus::Implemented => "implemented",
            ControlStatus::PartiallyImplemented => "partially_implemented",
            ControlStatus::NotImplemented => "not_implemented",
            ControlStatus::NotApplicable => "not_applicable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "implemented" => Some(ControlStatus::Implemented),
            "partially_implemented" | "partial" => Some(ControlStatus::PartiallyImplemented),
            "not_implemented" => Some(ControlStatus::NotImplemented),
            "not_applicable" | "n/a" => Some(ControlStatus::NotApplicable),
            _ => None,
        }
    }

    /// Weight towards the compliance score; `None` when excluded
    pub fn credit(&self) -> Option<f64> {
        match self {
            ControlStatus::Implemented => Some(1.0),
            ControlStatus::PartiallyImplemented => Some(0.5),
            ControlStatus::NotImplemented => Some(0.0),
            ControlStatus::NotApplicable => None,
        }
    }
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    /// Framework-local reference, e.g. `CC6.1`
    pub id: String,
    pub framework_id: String,
    pub title: String,
    pub category: String,
    pub status: ControlStatus,
    pub owner: Option<String>,
    /// RFC 3339 timestamp of the last test
    pub last_tested: Option<String>,
}

impl Control {
    pub fn new(
        id: impl Into<String>,
        framework_id: impl Into<String>,
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            framework_id: framework_id.into(),
            title: title.into(),
            category: category.into(),
            status: ControlStatus::NotImplemented,
            owner: None,
            last_tested: None,
        }
    }

    pub fn with_status(mut self, status: ControlStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Key unique across frameworks
    pub fn key(&self) -> String {
        format!("{}:{}", self.framework_id, self.id)
    }
}
