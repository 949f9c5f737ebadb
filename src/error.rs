//! Error types for the Milvus helper

use thiserror::Error;

/// Result type alias for Milvus helper operations
pub type Result<T> = std::result::Result<T, MilvusError>;

/// Error types that can occur while talking to Milvus
#[derive(Error, Debug)]
pub enum MilvusError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("Mismatch between number of vectors ({vectors}) and metadata entries ({metadata})")]
    CountMismatch { vectors: usize, metadata: usize },

    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Milvus error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("Timed out after {timeout_ms}ms waiting for {operation}")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
