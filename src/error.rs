//! Error types for evoref.

use thiserror::Error;

/// Result type for evoref operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for evoref operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Malformed document input (duplicate or non-monotonic order indices,
    /// duplicate mention ids). Aborts the document, never the batch.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Rejected configuration. Raised at engine construction, never later.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A similarity computation failed. Generators catch this and omit
    /// the affected feature.
    #[error("Similarity unavailable: {0}")]
    SimilarityUnavailable(String),

    /// Classifier artifact could not be loaded or serialized.
    #[error("Model error: {0}")]
    Model(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a similarity unavailable error.
    pub fn similarity_unavailable(msg: impl Into<String>) -> Self {
        Error::SimilarityUnavailable(msg.into())
    }

    /// Create a model error.
    pub fn model(msg: impl Into<String>) -> Self {
        Error::Model(msg.into())
    }
}
