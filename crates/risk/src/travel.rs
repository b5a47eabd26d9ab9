//! Travel risk: fixed weighted sum of four 0..=100 factors

use crate::scoring::{categorize, clamp_percent, RiskCategory};
use serde::{Deserialize, Serialize};
use shared::Result;

const SECURITY_WEIGHT: f64 = 0.35;
const HEALTH_WEIGHT: f64 = 0.25;
const POLITICAL_WEIGHT: f64 = 0.25;
const INFRASTRUCTURE_WEIGHT: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelRiskInput {
    pub security: f64,
    pub health: f64,
    pub political: f64,
    pub infrastructure: f64,
}

/// Weighted contribution of each factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelRiskFactors {
    pub security: f64,
    pub health: f64,
    pub political: f64,
    pub infrastructure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelRiskScore {
    pub score: f64,
    pub category: RiskCategory,
    pub factors: TravelRiskFactors,
}

pub fn travel_risk(input: TravelRiskInput) -> Result<TravelRiskScore> {
    let factors = TravelRiskFactors {
        security: clamp_percent("security", input.security)? * SECURITY_WEIGHT,
        health: clamp_percent("health", input.health)? * HEALTH_WEIGHT,
        political: clamp_percent("political", input.political)? * POLITICAL_WEIGHT,
        infrastructure: clamp_percent("infrastructure", input.infrastructure)? * INFRASTRUCTURE_WEIGHT,
    };

    let score = (factors.security + factors.health + factors.political + factors.infrastructure)
        .clamp(0.0, 100.0);

    Ok(TravelRiskScore {
        score,
        category: categorize(score),
        factors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(security: f64, health: f64, political: f64, infrastructure: f64) -> TravelRiskInput {
        TravelRiskInput {
            security,
            health,
            political,
            infrastructure,
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total = SECURITY_WEIGHT + HEALTH_WEIGHT + POLITICAL_WEIGHT + INFRASTRUCTURE_WEIGHT;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_inputs_score_the_same_value() {
        let result = travel_risk(input(70.0, 70.0, 70.0, 70.0)).unwrap();
        assert!((result.score - 70.0).abs() < 1e-9);
        assert_eq!(result.category, RiskCategory::High);
    }

    #[test]
    fn test_weighted_sum() {
        let result = travel_risk(input(100.0, 0.0, 0.0, 0.0)).unwrap();
        assert!((result.score - 35.0).abs() < 1e-9);
        assert_eq!(result.category, RiskCategory::Low);

        let result = travel_risk(input(0.0, 0.0, 0.0, 100.0)).unwrap();
        assert!((result.factors.infrastructure - 15.0).abs() < 1e-9);
        assert_eq!(result.category, RiskCategory::Minimal);
    }

    #[test]
    fn test_clamped_to_range() {
        let result = travel_risk(input(500.0, 500.0, 500.0, 500.0)).unwrap();
        assert!((result.score - 100.0).abs() < 1e-9);
        assert_eq!(result.category, RiskCategory::Critical);

        let result = travel_risk(input(-5.0, -5.0, -5.0, -5.0)).unwrap();
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_nan_rejected() {
        assert!(travel_risk(input(f64::NAN, 0.0, 0.0, 0.0)).is_err());
    }
}
