//! GRC CLI - Command-line interface for the GRC core
//!
//! Usage:
//!   grc risk score --inherent 70 --effectiveness 40
//!   grc risk matrix -l 4 -i 5 --effectiveness 25
//!   grc risk travel --security 60 --health 20 --political 40 --infrastructure 30
//!   grc evidence hash <file>
//!   grc webhook verify -p slack -s <secret> --signature v0=... -t <ts> <body-file>
//!   grc catalog frameworks
//!   grc catalog controls soc2
//!   grc demo

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use cli::commands::{CatalogCommand, DemoCommand, EvidenceCommand, RiskCommand, WebhookCommand};
use cli::Output;
use shared::GrcConfig;

#[derive(Parser)]
#[command(name = "grc")]
#[command(about = "GRC - Risk scoring, evidence, audit and compliance tooling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (JSON or YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output as a JSON envelope
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Risk scoring
    Risk(RiskCommand),
    /// Evidence hashing
    Evidence(EvidenceCommand),
    /// Webhook signatures
    Webhook(WebhookCommand),
    /// Compliance frameworks and controls
    Catalog(CatalogCommand),
    /// End-to-end walkthrough on an in-memory hub
    Demo(DemoCommand),
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GrcConfig> {
    match path {
        Some(path) => Ok(GrcConfig::from_file(path)?),
        None => Ok(GrcConfig::default()),
    }
}

fn run(cli: Cli, output: Output) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Risk(cmd) => cmd.run(output),
        Commands::Evidence(cmd) => cmd.run(output),
        Commands::Webhook(cmd) => cmd.run(output, &config),
        Commands::Catalog(cmd) => cmd.run(output),
        Commands::Demo(cmd) => cmd.run(output, config),
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(cli.json);

    match run(cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&e);
            ExitCode::FAILURE
        }
    }
}
