//! Error types for the Investment Insights workspace.
//!
//! This module defines a unified error enum covering the retrieval pipeline
//! failures (dimension mismatch, empty collection, collaborator outages,
//! malformed chunk parameters) as well as the ambient configuration, I/O,
//! storage and prompt errors.

use thiserror::Error;

/// Unified error type for the Investment Insights workspace.
///
/// All fallible functions return `Result<T, AppError>`. Retrieval-path
/// failures are typed variants so callers can tell a misconfigured pipeline
/// apart from a transient collaborator outage.
#[derive(Error, Debug)]
pub enum AppError {
    /// An embedding's length disagrees with the collection dimension.
    #[error("Dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A query was attempted against a collection with no entries.
    #[error("Collection '{0}' is empty. Run 'insight ingest' first.")]
    EmptyCollection(String),

    /// The embedding collaborator failed or is unreachable.
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The language model collaborator failed or is unreachable.
    #[error("Answerer unavailable: {0}")]
    AnswererUnavailable(String),

    /// Chunk size/overlap rejected at configuration time.
    #[error("Malformed chunk parameters: {0}")]
    MalformedChunkParameters(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Vector index persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether a caller-level retry may succeed.
    ///
    /// Only collaborator outages are transient; the pipeline itself never
    /// retries.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::EmbeddingUnavailable(_) | AppError::AnswererUnavailable(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
