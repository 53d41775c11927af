//! Error types for fastener-search

use thiserror::Error;

/// Errors that can occur in fastener-search operations
#[derive(Error, Debug)]
pub enum SearchError {
    /// Qdrant client error
    #[error("Qdrant error: {0}")]
    Qdrant(String),

    /// Collection not found
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Embedding error
    #[error("Embedding error: {0}")]
    Embedding(String),

    // =========================================================================
    // Provider errors
    // =========================================================================
    /// Embedding provider unavailable
    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Embedding dimension mismatch
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// OpenAI authentication failed
    #[error("OpenAI authentication failed: {0}")]
    OpenAIAuth(String),

    /// OpenAI rate limited
    #[error("OpenAI rate limited, retry after {retry_after:?} seconds")]
    OpenAIRateLimit { retry_after: Option<u64> },

    /// OpenAI model not found
    #[error("OpenAI model not found: {0}")]
    OpenAIInvalidModel(String),

    // =========================================================================
    // Indexing errors
    // =========================================================================
    /// Malformed chunk record in an input file
    #[error("Invalid chunk record at line {line}: {message}")]
    InvalidChunk { line: usize, message: String },

    /// Equivalence table could not be built
    #[error("Standard table error: {0}")]
    Table(#[from] fastener_core::TableError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] fastener_config::ConfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<qdrant_client::QdrantError> for SearchError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        SearchError::Qdrant(err.to_string())
    }
}

/// Result type for fastener-search operations
pub type Result<T> = std::result::Result<T, SearchError>;
