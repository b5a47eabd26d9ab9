//! # GRC CLI
//!
//! Subcommands of the `grc` binary and the shared output helper.

pub mod commands;
pub mod output;

pub use output::Output;
