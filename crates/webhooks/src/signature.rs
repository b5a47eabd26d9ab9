//! Webhook signature verification
//!
//! | provider | header value         | signed bytes                 |
//! |----------|----------------------|------------------------------|
//! | slack    | `v0=<hex>`           | `v0:{timestamp}:{body}`      |
//! | airtable | `hmac-sha256=<hex>`  | raw body                     |
//! | generic  | `sha256=<hex>`       | raw body                     |
//!
//! Comparison is constant-time through `Mac::verify_slice`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shared::{GrcConfig, GrcError, Result, DEFAULT_WEBHOOK_TOLERANCE_SECS};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookProvider {
    Slack,
    Airtable,
    Generic,
}

impl WebhookProvider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "slack" => Some(WebhookProvider::Slack),
            "airtable" => Some(WebhookProvider::Airtable),
            "generic" => Some(WebhookProvider::Generic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookProvider::Slack => "slack",
            WebhookProvider::Airtable => "airtable",
            WebhookProvider::Generic => "generic",
        }
    }

    fn signature_prefix(&self) -> &'static str {
        match self {
            WebhookProvider::Slack => "v0=",
            WebhookProvider::Airtable => "hmac-sha256=",
            WebhookProvider::Generic => "sha256=",
        }
    }
}

impl fmt::Display for WebhookProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signature-related header values of one request
#[derive(Debug, Clone, Default)]
pub struct SignatureHeaders {
    pub signature: String,
    /// Unix seconds; required for Slack
    pub timestamp: Option<String>,
}

fn signed_mac(
    provider: WebhookProvider,
    secret: &str,
    timestamp: Option<&str>,
    body: &[u8],
) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| GrcError::Signature(e.to_string()))?;
    if provider == WebhookProvider::Slack {
        let timestamp = timestamp
            .ok_or_else(|| GrcError::Signature("slack signature requires a timestamp".to_string()))?;
        mac.update(format!("v0:{}:", timestamp).as_bytes());
    }
    mac.update(body);
    Ok(mac)
}

/// Produce the header value a provider would send for `body`
pub fn sign(
    provider: WebhookProvider,
    secret: &str,
    timestamp: Option<&str>,
    body: &[u8],
) -> Result<String> {
    let mac = signed_mac(provider, secret, timestamp, body)?;
    Ok(format!(
        "{}{}",
        provider.signature_prefix(),
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Verifies inbound webhook signatures against configured secrets
#[derive(Clone)]
pub struct WebhookVerifier {
    secrets: HashMap<WebhookProvider, String>,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(tolerance_secs: i64) -> Self {
        Self {
            secrets: HashMap::new(),
            tolerance_secs: tolerance_secs.max(0),
        }
    }

    /// Build from config; unknown provider names are rejected
    pub fn from_config(config: &GrcConfig) -> Result<Self> {
        let mut verifier = Self::new(config.webhook_tolerance_secs);
        for (name, secret) in &config.webhook_secrets {
            let provider = WebhookProvider::parse(name)
                .ok_or_else(|| GrcError::Config(format!("unknown webhook provider '{}'", name)))?;
            verifier.set_secret(provider, secret.clone());
        }
        Ok(verifier)
    }

    pub fn set_secret(&mut self, provider: WebhookProvider, secret: impl Into<String>) {
        self.secrets.insert(provider, secret.into());
    }

    pub fn has_secret(&self, provider: WebhookProvider) -> bool {
        self.secrets.contains_key(&provider)
    }

    /// Verify against the current time
    pub fn verify(
        &self,
        provider: WebhookProvider,
        headers: &SignatureHeaders,
        body: &[u8],
    ) -> Result<()> {
        self.verify_at(provider, headers, body, Utc::now())
    }

    pub fn verify_at(
        &self,
        provider: WebhookProvider,
        headers: &SignatureHeaders,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let secret = self.secrets.get(&provider).ok_or_else(|| {
            GrcError::Config(format!("no webhook secret configured for {}", provider))
        })?;

        if provider == WebhookProvider::Slack {
            self.check_timestamp(headers.timestamp.as_deref(), now)?;
        }

        let hex_part = headers
            .signature
            .strip_prefix(provider.signature_prefix())
            .ok_or_else(|| {
                GrcError::Signature(format!(
                    "{} signature must start with '{}'",
                    provider,
                    provider.signature_prefix()
                ))
            })?;
        let expected = hex::decode(hex_part)
            .map_err(|e| GrcError::Signature(format!("signature is not valid hex: {}", e)))?;

        let mac = signed_mac(provider, secret, headers.timestamp.as_deref(), body)?;
        mac.verify_slice(&expected).map_err(|_| {
            warn!(provider = %provider, "webhook signature mismatch");
            GrcError::Signature(format!("{} signature mismatch", provider))
        })?;

        debug!(provider = %provider, bytes = body.len(), "webhook signature verified");
        Ok(())
    }

    fn check_timestamp(&self, timestamp: Option<&str>, now: DateTime<Utc>) -> Result<()> {
        let raw = timestamp
            .ok_or_else(|| GrcError::Signature("missing request timestamp".to_string()))?;
        let ts: i64 = raw
            .trim()
            .parse()
            .map_err(|_| GrcError::Signature(format!("invalid request timestamp '{}'", raw)))?;

        let skew = now.timestamp().abs_diff(ts);
        let tolerance = u64::try_from(self.tolerance_secs).unwrap_or(0);
        if skew > tolerance {
            return Err(GrcError::Signature(format!(
                "request timestamp is {}s away from now (tolerance {}s)",
                skew, self.tolerance_secs
            )));
        }
        Ok(())
    }
}

impl Default for WebhookVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_WEBHOOK_TOLERANCE_SECS)
    }
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Secrets stay out of logs
        f.debug_struct("WebhookVerifier")
            .field("providers", &self.secrets.keys().collect::<Vec<_>>())
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}
