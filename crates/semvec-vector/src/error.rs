//! Vector index error types.

use thiserror::Error;

use crate::engine::EngineError;

/// Errors that can occur during vector index operations.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Caller-supplied argument violates the index contract
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Buffer length is not a multiple of the index dimensionality
    #[error("Dimension mismatch: buffer of {len} floats is not a multiple of {dimensions}")]
    DimensionMismatch { dimensions: usize, len: usize },

    /// Add attempted on an index that needs training first
    #[error("{descriptor} index must be trained before adding vectors")]
    UntrainedIndex { descriptor: String },

    /// Native handle is absent
    #[error("Index not initialized")]
    NotInitialized,

    /// Index was released
    #[error("Index has been released")]
    Disposed,

    /// Engine could not allocate the index
    #[error("Index creation failed: {0}")]
    IndexCreation(EngineError),

    /// Engine rejected the training data
    #[error("Training failed: {0}")]
    TrainingFailed(EngineError),

    /// Engine rejected the vectors being added
    #[error("Add failed: {0}")]
    AddFailed(EngineError),

    /// Engine failed to search
    #[error("Search failed: {0}")]
    SearchFailed(EngineError),

    /// Embedding error
    #[error("Embedding error: {0}")]
    Embedding(#[from] semvec_embeddings::EmbeddingError),
}
