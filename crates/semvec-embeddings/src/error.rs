//! Embedding error types.

use thiserror::Error;

/// Errors that can occur during tokenization and embedding.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Vocabulary source missing, malformed, or lacking a reserved token
    #[error("Configuration error: {0}")]
    Config(String),

    /// Candle model error
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    /// Model file not found
    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    /// Download error
    #[error("Failed to download model: {0}")]
    Download(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Inference backend returned a tensor of the wrong shape
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
