//! # GRC Webhooks
//!
//! HMAC-SHA256 signature checks for inbound webhooks and conversion of
//! their JSON payloads into bus events.

mod ingest;
mod signature;

pub use ingest::ingest;
pub use signature::{sign, SignatureHeaders, WebhookProvider, WebhookVerifier};
