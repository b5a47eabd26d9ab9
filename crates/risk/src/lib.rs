//! # GRC Risk
//!
//! Risk arithmetic: residual risk after controls, fixed category buckets,
//! travel risk and an in-memory per-tenant risk register.

mod register;
mod scoring;
mod travel;

pub use register::{RiskAssessment, RiskRegister, RiskSummary};
pub use scoring::{
    categorize, inherent_from_likelihood_impact, residual, score, RiskCategory, RiskInput,
    RiskScore,
};
pub use travel::{travel_risk, TravelRiskInput, TravelRiskScore};
