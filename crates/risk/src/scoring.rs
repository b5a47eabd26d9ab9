//! Residual risk scoring
//!
//! `residual = inherent × (1 − effectiveness / 100)`, bucketed at 80/60/40/20.

use serde::{Deserialize, Serialize};
use shared::{GrcError, Result, Severity};
use std::fmt;

/// Lowest score of each bucket, highest first
const CRITICAL_FLOOR: f64 = 80.0;
const HIGH_FLOOR: f64 = 60.0;
const MEDIUM_FLOOR: f64 = 40.0;
const LOW_FLOOR: f64 = 20.0;

/// Risk bucket derived from a 0..=100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskCategory {
    pub const ALL: [RiskCategory; 5] = [
        RiskCategory::Critical,
        RiskCategory::High,
        RiskCategory::Medium,
        RiskCategory::Low,
        RiskCategory::Minimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Critical => "critical",
            RiskCategory::High => "high",
            RiskCategory::Medium => "medium",
            RiskCategory::Low => "low",
            RiskCategory::Minimal => "minimal",
        }
    }

    /// Event severity used when this category is published
    pub fn severity(&self) -> Severity {
        match self {
            RiskCategory::Critical => Severity::Critical,
            RiskCategory::High => Severity::High,
            RiskCategory::Medium => Severity::Medium,
            RiskCategory::Low => Severity::Low,
            RiskCategory::Minimal => Severity::Info,
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs for a residual risk calculation, both on a 0..=100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskInput {
    pub inherent: f64,
    pub control_effectiveness: f64,
}

/// Result of a residual risk calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScore {
    pub inherent: f64,
    pub control_effectiveness: f64,
    pub residual: f64,
    pub category: RiskCategory,
}

pub(crate) fn clamp_percent(name: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(GrcError::validation(format!("{} must be a finite number", name)));
    }
    Ok(value.clamp(0.0, 100.0))
}

/// Residual risk after applying control effectiveness.
///
/// Both inputs are clamped to [0, 100]; non-finite inputs are rejected.
pub fn residual(inherent: f64, effectiveness: f64) -> Result<f64> {
    let inherent = clamp_percent("inherent", inherent)?;
    let effectiveness = clamp_percent("effectiveness", effectiveness)?;
    Ok(apply_controls(inherent, effectiveness))
}

/// Residual arithmetic on inputs already clamped to [0, 100]
fn apply_controls(inherent: f64, effectiveness: f64) -> f64 {
    (inherent * (1.0 - effectiveness / 100.0)).clamp(0.0, 100.0)
}

/// Bucket a score. Lower bounds are inclusive.
pub fn categorize(score: f64) -> RiskCategory {
    if score >= CRITICAL_FLOOR {
        RiskCategory::Critical
    } else if score >= HIGH_FLOOR {
        RiskCategory::High
    } else if score >= MEDIUM_FLOOR {
        RiskCategory::Medium
    } else if score >= LOW_FLOOR {
        RiskCategory::Low
    } else {
        RiskCategory::Minimal
    }
}

/// Full residual score for an input
pub fn score(input: RiskInput) -> Result<RiskScore> {
    let inherent = clamp_percent("inherent", input.inherent)?;
    let control_effectiveness = clamp_percent("effectiveness", input.control_effectiveness)?;
    let residual = apply_controls(inherent, control_effectiveness);

    Ok(RiskScore {
        inherent,
        control_effectiveness,
        residual,
        category: categorize(residual),
    })
}

/// Map a 5×5 likelihood/impact heat map cell onto 0..=100
pub fn inherent_from_likelihood_impact(likelihood: u8, impact: u8) -> Result<f64> {
    if !(1..=5).contains(&likelihood) {
        return Err(GrcError::validation(format!(
            "likelihood must be between 1 and 5, got {}",
            likelihood
        )));
    }
    if !(1..=5).contains(&impact) {
        return Err(GrcError::validation(format!(
            "impact must be between 1 and 5, got {}",
            impact
        )));
    }
    Ok(f64::from(likelihood) * f64::from(impact) * 4.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residual_formula() {
        assert_eq!(residual(80.0, 50.0).unwrap(), 40.0);
        assert_eq!(residual(100.0, 0.0).unwrap(), 100.0);
        assert_eq!(residual(100.0, 100.0).unwrap(), 0.0);
        assert_eq!(residual(60.0, 25.0).unwrap(), 45.0);
    }

    #[test]
    fn test_residual_clamps_inputs() {
        // Out-of-range inputs are clamped before computing
        assert_eq!(residual(150.0, 0.0).unwrap(), 100.0);
        assert_eq!(residual(50.0, -20.0).unwrap(), 50.0);
        assert_eq!(residual(50.0, 140.0).unwrap(), 0.0);
        assert_eq!(residual(-10.0, 10.0).unwrap(), 0.0);
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(residual(f64::NAN, 10.0).is_err());
        assert!(residual(10.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_category_boundaries_inclusive() {
        assert_eq!(categorize(100.0), RiskCategory::Critical);
        assert_eq!(categorize(80.0), RiskCategory::Critical);
        assert_eq!(categorize(79.99), RiskCategory::High);
        assert_eq!(categorize(60.0), RiskCategory::High);
        assert_eq!(categorize(59.99), RiskCategory::Medium);
        assert_eq!(categorize(40.0), RiskCategory::Medium);
        assert_eq!(categorize(39.99), RiskCategory::Low);
        assert_eq!(categorize(20.0), RiskCategory::Low);
        assert_eq!(categorize(19.99), RiskCategory::Minimal);
        assert_eq!(categorize(0.0), RiskCategory::Minimal);
    }

    #[test]
    fn test_score_is_deterministic() {
        let input = RiskInput {
            inherent: 90.0,
            control_effectiveness: 30.0,
        };
        let a = score(input).unwrap();
        let b = score(input).unwrap();
        assert_eq!(a, b);
        assert!((a.residual - 63.0).abs() < 1e-9);
        assert_eq!(a.category, RiskCategory::High);
    }

    #[test]
    fn test_score_matches_residual() {
        let scored = score(RiskInput {
            inherent: 120.0,
            control_effectiveness: -5.0,
        })
        .unwrap();
        assert_eq!(scored.inherent, 100.0);
        assert_eq!(scored.control_effectiveness, 0.0);
        assert_eq!(scored.residual, residual(120.0, -5.0).unwrap());

        assert!(score(RiskInput {
            inherent: f64::NAN,
            control_effectiveness: 10.0,
        })
        .is_err());
    }

    #[test]
    fn test_likelihood_impact() {
        assert_eq!(inherent_from_likelihood_impact(5, 5).unwrap(), 100.0);
        assert_eq!(inherent_from_likelihood_impact(1, 1).unwrap(), 4.0);
        assert_eq!(inherent_from_likelihood_impact(3, 4).unwrap(), 48.0);
        assert!(inherent_from_likelihood_impact(0, 3).is_err());
        assert!(inherent_from_likelihood_impact(3, 6).is_err());
    }

    #[test]
    fn test_category_severity() {
        assert_eq!(RiskCategory::Critical.severity(), Severity::Critical);
        assert_eq!(RiskCategory::Minimal.severity(), Severity::Info);
        assert!(RiskCategory::High > RiskCategory::Medium);
    }

    #[test]
    fn test_score_json_shape() {
        let json = serde_json::to_value(
            score(RiskInput {
                inherent: 50.0,
                control_effectiveness: 20.0,
            })
            .unwrap(),
        )
        .unwrap();
        assert_eq!(json["controlEffectiveness"], 20.0);
        assert_eq!(json["residual"], 40.0);
        assert_eq!(json["category"], "medium");
    }
}
