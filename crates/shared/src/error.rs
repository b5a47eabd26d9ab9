//! Error types for GRC

use thiserror::Error;

/// Error thrown when an entity lookup fails
#[derive(Debug, Error)]
#[error("{kind} '{id}' not found")]
pub struct NotFoundError {
    pub kind: &'static str,
    pub id: String,
}

impl NotFoundError {
    pub fn new(kind: &'static str, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// Error thrown when an entity cannot move to the requested state
#[derive(Debug, Error)]
#[error("Cannot move {kind} '{id}' from '{from}' to '{to}'")]
pub struct InvalidTransitionError {
    pub kind: &'static str,
    pub id: String,
    pub from: String,
    pub to: String,
}

/// General GRC error type
#[derive(Debug, Error)]
pub enum GrcError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Signature error: {0}")]
    Signature(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GrcError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        GrcError::Validation(message.into())
    }

    /// Shorthand for a missing entity
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        GrcError::NotFound(NotFoundError::new(kind, id))
    }
}

pub type Result<T> = std::result::Result<T, GrcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = GrcError::not_found("Evidence", "ev-1");
        assert_eq!(err.to_string(), "Evidence 'ev-1' not found");
    }

    #[test]
    fn test_transition_message() {
        let err: GrcError = InvalidTransitionError {
            kind: "Evidence",
            id: "ev-1".to_string(),
            from: "approved".to_string(),
            to: "rejected".to_string(),
        }
        .into();
        assert!(err.to_string().contains("from 'approved' to 'rejected'"));
    }
}
