//! Error types for the labrank pipeline.
//!
//! Only configuration errors are fatal for a run. File-level and
//! embedding-level errors are contained where they occur (see
//! [`crate::enhancer`] and [`crate::embedding::EmbeddingProvider`]).

/// Top-level error type for scoring and label preparation.
#[derive(Debug, thiserror::Error)]
pub enum RankError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited-file read or write error.
    #[error("CSV error: {0}")]
    Csv(String),

    /// Invalid configuration or query registry.
    #[error("config error: {0}")]
    Config(String),

    /// A query with no Query Registry entry.
    #[error("unknown query: {0}")]
    UnknownQuery(String),

    /// Embedding model download or construction error.
    #[error("model error: {0}")]
    Model(String),

    /// Embedding encode error.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Input file is readable but unusable (e.g. no identifier column).
    #[error("data error: {0}")]
    Data(String),
}

impl From<csv::Error> for RankError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, RankError>;
