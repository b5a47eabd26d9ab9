//! Catalog models

pub mod control;
pub mod framework;
