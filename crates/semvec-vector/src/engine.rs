//! Search engine boundary.
//!
//! An `IndexEngine` turns `(dimensions, factory string)` into an owned
//! `NativeIndex`. Buffers are flat: `n * d` floats in, `n * k` distances and
//! positions out, query-major. Positions are 0-based insertion order; slots
//! with no neighbor hold `NO_MATCH`. Dropping the handle frees it.

use thiserror::Error;

use crate::exact::ExactEngine;
use crate::hnsw::UsearchEngine;

/// Position written for result slots that have no neighbor.
pub const NO_MATCH: i64 = -1;

/// Engine failure: non-zero return code plus the engine's last error text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (error {code})")]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// One allocated index inside an engine.
pub trait NativeIndex: Send {
    fn dimensions(&self) -> usize;

    fn is_trained(&self) -> bool;

    /// Number of stored vectors
    fn ntotal(&self) -> usize;

    /// Learn from `n` vectors laid out in `vectors`.
    fn train(&mut self, n: usize, vectors: &[f32]) -> Result<(), EngineError>;

    /// Append `n` vectors; they receive positions `ntotal..ntotal + n`.
    fn add(&mut self, n: usize, vectors: &[f32]) -> Result<(), EngineError>;

    /// Fill `distances` and `labels` (each `n * k`) with the nearest
    /// neighbors of `n` queries, best first.
    fn search(
        &self,
        n: usize,
        queries: &[f32],
        k: usize,
        distances: &mut [f32],
        labels: &mut [i64],
    ) -> Result<(), EngineError>;
}

/// Allocates native indexes from factory strings.
pub trait IndexEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this engine understands `factory`.
    fn supports(&self, factory: &str) -> bool;

    fn create(&self, dimensions: usize, factory: &str) -> Result<Box<dyn NativeIndex>, EngineError>;
}

/// Routes each factory string to the first engine that supports it:
/// usearch for graph indexes, the in-process exact engine otherwise.
pub struct BuiltinEngine {
    engines: Vec<Box<dyn IndexEngine>>,
}

impl BuiltinEngine {
    pub fn new() -> Self {
        Self {
            engines: vec![
                Box::new(UsearchEngine::default()),
                Box::new(ExactEngine::default()),
            ],
        }
    }

    pub fn with_engines(engines: Vec<Box<dyn IndexEngine>>) -> Self {
        Self { engines }
    }
}

impl Default for BuiltinEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexEngine for BuiltinEngine {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn supports(&self, factory: &str) -> bool {
        self.engines.iter().any(|e| e.supports(factory))
    }

    fn create(&self, dimensions: usize, factory: &str) -> Result<Box<dyn NativeIndex>, EngineError> {
        let engine = self
            .engines
            .iter()
            .find(|e| e.supports(factory))
            .ok_or_else(|| EngineError::new(-1, format!("unsupported factory string: {factory}")))?;
        engine.create(dimensions, factory)
    }
}
