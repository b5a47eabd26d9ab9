//! # GRC Shared
//!
//! Common types and interfaces used across all GRC crates.

pub mod config;
pub mod error;
pub mod pattern;
pub mod response;
pub mod types;

// Re-exports
pub use config::*;
pub use error::*;
pub use pattern::TopicPattern;
pub use response::ApiResponse;
pub use types::*;
