//! grc catalog command

use catalog::{compliance_score, CatalogRepository, ComplianceScore, Control, InMemoryCatalog};
use clap::{Args, Subcommand};
use console::style;

use crate::output::{badge, heading, Output};

#[derive(Debug, Args)]
pub struct CatalogCommand {
    #[command(subcommand)]
    pub command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum CatalogSubcommand {
    /// List frameworks with their compliance score
    Frameworks,
    /// List the controls of one framework
    Controls {
        /// Framework id, e.g. soc2
        framework: String,
    },
}

fn score_level(score: f64) -> u8 {
    if score >= 80.0 {
        0
    } else if score >= 50.0 {
        2
    } else {
        4
    }
}

impl CatalogCommand {
    pub fn run(&self, output: Output) -> anyhow::Result<()> {
        let repo = InMemoryCatalog::new();
        catalog::seed::seed(&repo)?;

        match &self.command {
            CatalogSubcommand::Frameworks => {
                let scores = repo
                    .list_frameworks()?
                    .iter()
                    .map(|fw| compliance_score(&repo, &fw.id))
                    .collect::<shared::Result<Vec<ComplianceScore>>>()?;
                output.emit(&scores, |scores| {
                    heading("Frameworks");
                    for s in scores {
                        println!(
                            "  {:<10} {:<36} {:>3} controls  {}",
                            style(&s.framework_id).cyan(),
                            s.framework_name,
                            s.total_controls,
                            badge(&format!("{:.1}%", s.score), score_level(s.score)),
                        );
                    }
                })
            }
            CatalogSubcommand::Controls { framework } => {
                if !repo.has_framework(framework)? {
                    anyhow::bail!("unknown framework '{}'", framework);
                }
                let controls = repo.controls_for(framework)?;
                output.emit(&controls, |controls: &Vec<Control>| {
                    heading(&format!("Controls of {}", framework));
                    for c in controls {
                        println!(
                            "  {:<10} {:<40} {}",
                            style(&c.id).cyan(),
                            c.title,
                            c.status
                        );
                    }
                })
            }
        }
    }
}
