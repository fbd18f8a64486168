//! Error types for the issue generation pipeline.
//!
//! Two families: `GenerationError` aborts a whole run, while `FailureReason`
//! is recorded against a single placeholder and surfaces as a sentinel in the
//! rendered document.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal run errors. Any of these stops the run before output is produced.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No template found for document type '{doc_type}' in {dir:?}")]
    TemplateNotFound { doc_type: String, dir: PathBuf },

    #[error("LLM service unavailable: {0}")]
    Transport(String),

    #[error("Generation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for GenerationError {
    fn from(err: config::ConfigError) -> Self {
        GenerationError::Config(err.to_string())
    }
}

/// Errors raised by a completion client for a single round trip.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Transport(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,
}

/// Raised when raw model output cannot be turned into a usable value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("response contained no usable text")]
    Blank,

    #[error("response contained no list items")]
    NoItems,

    #[error("'{0}' is not one of the configured options")]
    UnknownOption(String),

    #[error("response contained no well-formed table rows")]
    NoTableRows,
}

/// Per-placeholder failure. Recorded, never propagated as a hard stop.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FailureReason {
    #[error("no prompt descriptor configured for this placeholder")]
    UnknownPlaceholder,

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("normalization failed: {0}")]
    Normalization(#[from] NormalizationError),
}
