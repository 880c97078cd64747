use std::io;
use thiserror::Error;

/// Application-wide error type, consolidating all possible errors into a single enum.
///
/// Only loading paths (documents, configuration, classifier artifact) surface these.
/// Conversation-level conditions such as conflicts or bad selections are ordinary
/// values, not errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents malformed JSON documents (taxonomy, knowledge base).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Represents a classifier artifact that cannot be decoded or is unsupported.
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Represents a runtime failure while querying the classifier.
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// Represents configuration-related errors (e.g., unparsable environment variables).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Represents data validation errors (e.g., thresholds out of range).
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Artifact(format!("bincode error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation errors: {}", err))
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
