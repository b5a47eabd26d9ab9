//! grc risk command

use clap::{Args, Subcommand};
use risk::{RiskCategory, RiskInput, RiskScore, TravelRiskInput, TravelRiskScore};

use crate::output::{badge, field, heading, Output};

#[derive(Debug, Args)]
pub struct RiskCommand {
    #[command(subcommand)]
    pub command: RiskSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum RiskSubcommand {
    /// Residual risk from an inherent score and control effectiveness
    Score {
        /// Inherent risk, 0-100
        #[arg(long)]
        inherent: f64,
        /// Control effectiveness, 0-100 percent
        #[arg(long, default_value_t = 0.0)]
        effectiveness: f64,
    },
    /// Residual risk from a 5x5 likelihood/impact matrix
    Matrix {
        /// Likelihood, 1-5
        #[arg(short, long)]
        likelihood: u8,
        /// Impact, 1-5
        #[arg(short, long)]
        impact: u8,
        /// Control effectiveness, 0-100 percent
        #[arg(long, default_value_t = 0.0)]
        effectiveness: f64,
    },
    /// Weighted travel risk for a destination
    Travel {
        #[arg(long)]
        security: f64,
        #[arg(long)]
        health: f64,
        #[arg(long)]
        political: f64,
        #[arg(long)]
        infrastructure: f64,
    },
}

pub(crate) fn category_level(category: RiskCategory) -> u8 {
    match category {
        RiskCategory::Minimal => 0,
        RiskCategory::Low => 1,
        RiskCategory::Medium => 2,
        RiskCategory::High => 3,
        RiskCategory::Critical => 4,
    }
}

fn print_score(score: &RiskScore) {
    heading("Risk score");
    field("inherent", format!("{:.1}", score.inherent));
    field("control effectiveness", format!("{:.1}%", score.control_effectiveness));
    field("residual", format!("{:.1}", score.residual));
    field(
        "category",
        badge(score.category.as_str(), category_level(score.category)),
    );
}

fn print_travel(score: &TravelRiskScore) {
    heading("Travel risk");
    field("security", format!("{:.1}", score.factors.security));
    field("health", format!("{:.1}", score.factors.health));
    field("political", format!("{:.1}", score.factors.political));
    field("infrastructure", format!("{:.1}", score.factors.infrastructure));
    field("score", format!("{:.1}", score.score));
    field(
        "category",
        badge(score.category.as_str(), category_level(score.category)),
    );
}

impl RiskCommand {
    pub fn run(&self, output: Output) -> anyhow::Result<()> {
        match &self.command {
            RiskSubcommand::Score {
                inherent,
                effectiveness,
            } => {
                let score = risk::score(RiskInput {
                    inherent: *inherent,
                    control_effectiveness: *effectiveness,
                })?;
                output.emit(&score, print_score)
            }
            RiskSubcommand::Matrix {
                likelihood,
                impact,
                effectiveness,
            } => {
                let inherent = risk::inherent_from_likelihood_impact(*likelihood, *impact)?;
                let score = risk::score(RiskInput {
                    inherent,
                    control_effectiveness: *effectiveness,
                })?;
                output.emit(&score, print_score)
            }
            RiskSubcommand::Travel {
                security,
                health,
                political,
                infrastructure,
            } => {
                let score = risk::travel_risk(TravelRiskInput {
                    security: *security,
                    health: *health,
                    political: *political,
                    infrastructure: *infrastructure,
                })?;
                output.emit(&score, print_travel)
            }
        }
    }
}
