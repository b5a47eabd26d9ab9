//! grc webhook command

use anyhow::Context;
use clap::{Args, Subcommand};
use serde::Serialize;
use shared::GrcConfig;
use std::path::PathBuf;
use webhooks::{SignatureHeaders, WebhookProvider, WebhookVerifier};

use crate::output::{badge, field, heading, Output};

#[derive(Debug, Args)]
pub struct WebhookCommand {
    #[command(subcommand)]
    pub command: WebhookSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum WebhookSubcommand {
    /// Verify an HMAC signature over a saved request body
    Verify {
        /// slack, airtable or generic
        #[arg(short, long)]
        provider: String,
        /// Shared secret; falls back to the config file
        #[arg(short, long)]
        secret: Option<String>,
        /// Signature header value, prefix included
        #[arg(long)]
        signature: String,
        /// Request timestamp header (Slack)
        #[arg(short, long)]
        timestamp: Option<String>,
        /// File holding the raw request body
        body: PathBuf,
    },
    /// Produce the signature header a provider would send
    Sign {
        #[arg(short, long)]
        provider: String,
        #[arg(short, long)]
        secret: String,
        #[arg(short, long)]
        timestamp: Option<String>,
        body: PathBuf,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
    pub provider: WebhookProvider,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn parse_provider(name: &str) -> anyhow::Result<WebhookProvider> {
    WebhookProvider::parse(name)
        .with_context(|| format!("unknown webhook provider '{}'", name))
}

fn print_result(r: &VerifyResult) {
    heading("Webhook signature");
    field("provider", r.provider);
    if r.valid {
        field("result", badge("valid", 0));
    } else {
        field("result", badge("INVALID", 4));
        if let Some(reason) = &r.reason {
            field("reason", reason);
        }
    }
}

impl WebhookCommand {
    pub fn run(&self, output: Output, config: &GrcConfig) -> anyhow::Result<()> {
        match &self.command {
            WebhookSubcommand::Verify {
                provider,
                secret,
                signature,
                timestamp,
                body,
            } => {
                let provider = parse_provider(provider)?;
                let mut verifier = WebhookVerifier::from_config(config)?;
                if let Some(secret) = secret {
                    verifier.set_secret(provider, secret.clone());
                }
                if !verifier.has_secret(provider) {
                    anyhow::bail!("no secret for provider '{}'", provider);
                }

                let body = std::fs::read(body)
                    .with_context(|| format!("reading {}", body.display()))?;
                let headers = SignatureHeaders {
                    signature: signature.clone(),
                    timestamp: timestamp.clone(),
                };
                let outcome = verifier.verify(provider, &headers, &body);
                let result = VerifyResult {
                    provider,
                    valid: outcome.is_ok(),
                    reason: outcome.err().map(|e| e.to_string()),
                };

                if result.valid {
                    output.emit(&result, print_result)
                } else {
                    output.fail(&result, "webhook signature rejected", print_result)
                }
            }
            WebhookSubcommand::Sign {
                provider,
                secret,
                timestamp,
                body,
            } => {
                let provider = parse_provider(provider)?;
                let body = std::fs::read(body)
                    .with_context(|| format!("reading {}", body.display()))?;
                let signature = webhooks::sign(provider, secret, timestamp.as_deref(), &body)?;
                output.emit(&signature, |s| println!("{}", s))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn body_file(content: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_verify_generic_signature() {
        let file = body_file(br#"{"type":"ping"}"#);
        let signature =
            webhooks::sign(WebhookProvider::Generic, "s3cr3t", None, br#"{"type":"ping"}"#).unwrap();

        let cmd = WebhookCommand {
            command: WebhookSubcommand::Verify {
                provider: "generic".to_string(),
                secret: Some("s3cr3t".to_string()),
                signature,
                timestamp: None,
                body: file.path().to_path_buf(),
            },
        };
        assert!(cmd.run(Output::new(true), &GrcConfig::default()).is_ok());
    }

    #[test]
    fn test_verify_uses_config_secret() {
        let file = body_file(b"{}");
        let signature = webhooks::sign(WebhookProvider::Airtable, "from-config", None, b"{}").unwrap();
        let mut config = GrcConfig::default();
        config
            .webhook_secrets
            .insert("airtable".to_string(), "from-config".to_string());

        let cmd = WebhookCommand {
            command: WebhookSubcommand::Verify {
                provider: "airtable".to_string(),
                secret: None,
                signature,
                timestamp: None,
                body: file.path().to_path_buf(),
            },
        };
        assert!(cmd.run(Output::new(true), &config).is_ok());
    }

    #[test]
    fn test_verify_rejects_bad_signature_and_missing_secret() {
        let file = body_file(b"{}");
        let mut cmd = WebhookCommand {
            command: WebhookSubcommand::Verify {
                provider: "generic".to_string(),
                secret: Some("s3cr3t".to_string()),
                signature: "sha256=00".to_string(),
                timestamp: None,
                body: file.path().to_path_buf(),
            },
        };
        let err = cmd.run(Output::new(true), &GrcConfig::default()).unwrap_err();
        assert!(err.is::<crate::output::Reported>());

        if let WebhookSubcommand::Verify { secret, .. } = &mut cmd.command {
            *secret = None;
        }
        let err = cmd.run(Output::new(true), &GrcConfig::default()).unwrap_err();
        assert!(!err.is::<crate::output::Reported>());
    }

    #[test]
    fn test_unknown_provider() {
        assert!(parse_provider("github").is_err());
    }
}
