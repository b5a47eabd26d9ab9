//! RiskRegister - Per-tenant register of assessed risks

use crate::scoring::{score, RiskCategory, RiskInput, RiskScore};
use serde::{Deserialize, Serialize};
use shared::{GrcError, Result, TenantId};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::debug;

/// A named risk with its latest score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub id: String,
    pub tenant_id: TenantId,
    pub title: String,
    pub owner: Option<String>,
    pub score: RiskScore,
    pub assessed_at: String,
}

/// Aggregate view over one tenant's register
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    pub total: usize,
    pub mean_residual: f64,
    pub max_residual: f64,
    pub by_category: BTreeMap<RiskCategory, usize>,
}

/// In-memory risk register
#[derive(Debug, Default)]
pub struct RiskRegister {
    risks: RwLock<HashMap<String, RiskAssessment>>,
}

impl RiskRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score and store a risk. Reassessing an existing id replaces its score.
    pub fn assess(
        &self,
        tenant_id: &TenantId,
        title: &str,
        owner: Option<&str>,
        input: RiskInput,
    ) -> Result<RiskAssessment> {
        if title.trim().is_empty() {
            return Err(GrcError::validation("risk title is required"));
        }

        let assessment = RiskAssessment {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.clone(),
            title: title.to_string(),
            owner: owner.map(|s| s.to_string()),
            score: score(input)?,
            assessed_at: chrono::Utc::now().to_rfc3339(),
        };
        self.insert(assessment.clone())?;
        Ok(assessment)
    }

    /// Re-score an existing risk with new inputs
    pub fn reassess(&self, id: &str, input: RiskInput) -> Result<RiskAssessment> {
        let new_score = score(input)?;
        let mut risks = self.risks.write().map_err(|_| GrcError::LockPoisoned("risk register"))?;
        let risk = risks
            .get_mut(id)
            .ok_or_else(|| GrcError::not_found("Risk", id))?;
        risk.score = new_score;
        risk.assessed_at = chrono::Utc::now().to_rfc3339();
        debug!(risk_id = id, residual = new_score.residual, "risk reassessed");
        Ok(risk.clone())
    }

    fn insert(&self, assessment: RiskAssessment) -> Result<()> {
        let mut risks = self.risks.write().map_err(|_| GrcError::LockPoisoned("risk register"))?;
        debug!(
            risk_id = %assessment.id,
            tenant = %assessment.tenant_id,
            residual = assessment.score.residual,
            category = %assessment.score.category,
            "risk assessed"
        );
        risks.insert(assessment.id.clone(), assessment);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<RiskAssessment>> {
        let risks = self.risks.read().map_err(|_| GrcError::LockPoisoned("risk register"))?;
        Ok(risks.get(id).cloned())
    }

    /// All risks of a tenant, highest residual first
    pub fn list(&self, tenant_id: &TenantId) -> Result<Vec<RiskAssessment>> {
        let risks = self.risks.read().map_err(|_| GrcError::LockPoisoned("risk register"))?;
        let mut list: Vec<_> = risks
            .values()
            .filter(|r| &r.tenant_id == tenant_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.score.residual.total_cmp(&a.score.residual));
        Ok(list)
    }

    pub fn summary(&self, tenant_id: &TenantId) -> Result<RiskSummary> {
        let list = self.list(tenant_id)?;
        if list.is_empty() {
            return Ok(RiskSummary::default());
        }

        let mut by_category = BTreeMap::new();
        for risk in &list {
            *by_category.entry(risk.score.category).or_insert(0) += 1;
        }
        let total_residual: f64 = list.iter().map(|r| r.score.residual).sum();

        Ok(RiskSummary {
            total: list.len(),
            mean_residual: total_residual / list.len() as f64,
            // list is sorted by residual, highest first
            max_residual: list[0].score.residual,
            by_category,
        })
    }

    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut risks = self.risks.write().map_err(|_| GrcError::LockPoisoned("risk register"))?;
        Ok(risks.remove(id).is_some())
    }
}
