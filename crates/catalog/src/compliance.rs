//! Per-framework compliance scoring
//!
//! `score = (implemented + 0.5 × partial) / applicable × 100`.
//! Not-applicable controls are left out; no applicable controls scores 0.

use crate::model::control::ControlStatus;
use crate::repository::CatalogRepository;
use serde::{Deserialize, Serialize};
use shared::{GrcError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceScore {
    pub framework_id: String,
    pub framework_name: String,
    pub score: f64,
    pub total_controls: usize,
    pub implemented: usize,
    pub partially_implemented: usize,
    pub not_implemented: usize,
    pub not_applicable: usize,
}

pub fn compliance_score(repo: &dyn CatalogRepository, framework_id: &str) -> Result<ComplianceScore> {
    let framework = repo
        .get_framework(framework_id)?
        .ok_or_else(|| GrcError::not_found("Framework", framework_id))?;
    let controls = repo.controls_for(framework_id)?;

    let count = |status: ControlStatus| controls.iter().filter(|c| c.status == status).count();
    let credits: Vec<f64> = controls.iter().filter_map(|c| c.status.credit()).collect();

    let score = if credits.is_empty() {
        0.0
    } else {
        credits.iter().sum::<f64>() / credits.len() as f64 * 100.0
    };

    Ok(ComplianceScore {
        framework_id: framework.id,
        framework_name: framework.name,
        score,
        total_controls: controls.len(),
        implemented: count(ControlStatus::Implemented),
        partially_implemented: count(ControlStatus::PartiallyImplemented),
        not_implemented: count(ControlStatus::NotImplemented),
        not_applicable: count(ControlStatus::NotApplicable),
    })
}
