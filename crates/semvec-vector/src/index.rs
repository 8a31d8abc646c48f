//! Vector index lifecycle.
//!
//! A `VectorIndex` owns exactly one native handle and enforces
//! Created -> Trained -> Populated -> Released. The handle is freed once,
//! either by `release()` or on drop.
//!
//! Not synchronized: callers sharing one index across threads must lock it.

use std::ops::Range;

use semvec_embeddings::Embedding;
use tracing::{debug, info};

use crate::descriptor::IndexDescriptor;
use crate::engine::{IndexEngine, NativeIndex};
use crate::error::VectorError;

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// Handle allocated, nothing trained or stored
    Created,
    /// Training done (or not needed), nothing stored yet
    Trained,
    /// At least one successful add
    Populated,
    /// Handle freed; terminal
    Released,
}

/// Raw batched search output, query-major.
///
/// Query `q` owns entries `q * k .. (q + 1) * k` of both buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBatch {
    pub k: usize,
    pub distances: Vec<f32>,
    pub positions: Vec<i64>,
}

impl SearchBatch {
    pub fn num_queries(&self) -> usize {
        if self.k == 0 {
            0
        } else {
            self.positions.len() / self.k
        }
    }

    /// Distances and positions for one query, `None` past the last one.
    pub fn query(&self, q: usize) -> Option<(&[f32], &[i64])> {
        if q >= self.num_queries() {
            return None;
        }
        let range = q * self.k..(q + 1) * self.k;
        Some((self.distances.get(range.clone())?, self.positions.get(range)?))
    }
}

/// Index over fixed-dimension vectors.
pub struct VectorIndex {
    handle: Option<Box<dyn NativeIndex>>,
    dimensions: usize,
    descriptor: IndexDescriptor,
    trained: bool,
    state: IndexState,
}

impl VectorIndex {
    /// Allocate a native index for `descriptor`.
    pub fn create(
        engine: &dyn IndexEngine,
        dimensions: usize,
        descriptor: IndexDescriptor,
    ) -> Result<Self, VectorError> {
        let handle = engine
            .create(dimensions, descriptor.factory_string())
            .map_err(VectorError::IndexCreation)?;

        info!(
            engine = engine.name(),
            descriptor = %descriptor,
            dim = dimensions,
            "Created vector index"
        );

        Ok(Self {
            handle: Some(handle),
            dimensions,
            descriptor,
            trained: !descriptor.requires_training(),
            state: IndexState::Created,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn descriptor(&self) -> IndexDescriptor {
        self.descriptor
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Number of stored vectors; 0 once released.
    pub fn len(&self) -> usize {
        self.handle.as_ref().map_or(0, |h| h.ntotal())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_handle(&self) -> Result<&dyn NativeIndex, VectorError> {
        match &self.handle {
            Some(handle) => Ok(handle.as_ref()),
            None => Err(VectorError::Disposed),
        }
    }

    fn vector_count(&self, len: usize) -> Result<usize, VectorError> {
        if self.dimensions == 0 {
            return Err(VectorError::InvalidArgument(
                "dimensions must be greater than zero".to_string(),
            ));
        }
        if len % self.dimensions != 0 {
            return Err(VectorError::DimensionMismatch {
                dimensions: self.dimensions,
                len,
            });
        }
        Ok(len / self.dimensions)
    }

    /// Train on a flat buffer of `n * dimensions` floats.
    pub fn train(&mut self, vectors: &[f32]) -> Result<(), VectorError> {
        if self.dimensions == 0 {
            return Err(VectorError::InvalidArgument(
                "dimensions must be greater than zero".to_string(),
            ));
        }
        if vectors.is_empty() {
            return Err(VectorError::InvalidArgument(
                "training vectors cannot be empty".to_string(),
            ));
        }
        if vectors.len() % self.dimensions != 0 {
            return Err(VectorError::InvalidArgument(format!(
                "training vectors length ({}) must be a multiple of dimensions ({})",
                vectors.len(),
                self.dimensions
            )));
        }
        let n = vectors.len() / self.dimensions;

        let handle = self.handle.as_mut().ok_or(VectorError::NotInitialized)?;
        handle
            .train(n, vectors)
            .map_err(VectorError::TrainingFailed)?;

        self.trained = true;
        if self.state == IndexState::Created {
            self.state = IndexState::Trained;
        }
        info!(n, descriptor = %self.descriptor, "Trained vector index");
        Ok(())
    }

    /// Append a flat buffer of vectors.
    ///
    /// Returns the insertion positions assigned, in order.
    pub fn add(&mut self, vectors: &[f32]) -> Result<Range<usize>, VectorError> {
        self.live_handle()?;
        let n = self.vector_count(vectors.len())?;

        if self.descriptor.requires_training() && !self.trained {
            return Err(VectorError::UntrainedIndex {
                descriptor: self.descriptor.to_string(),
            });
        }

        let start = self.len();
        if n == 0 {
            return Ok(start..start);
        }

        let handle = self.handle.as_mut().ok_or(VectorError::Disposed)?;
        handle.add(n, vectors).map_err(VectorError::AddFailed)?;

        self.state = IndexState::Populated;
        debug!(n, total = start + n, "Added vectors");
        Ok(start..start + n)
    }

    /// Add one embedding; returns its insertion position.
    pub fn add_embedding(&mut self, embedding: &Embedding) -> Result<usize, VectorError> {
        if embedding.dimension() != self.dimensions {
            return Err(VectorError::DimensionMismatch {
                dimensions: self.dimensions,
                len: embedding.dimension(),
            });
        }
        self.add(&embedding.values).map(|range| range.start)
    }

    /// Batched k-nearest-neighbor search over a flat query buffer.
    pub fn search(&self, queries: &[f32], k: usize) -> Result<SearchBatch, VectorError> {
        let handle = self.live_handle()?;
        let n = self.vector_count(queries.len())?;
        if k == 0 {
            return Err(VectorError::InvalidArgument("k must be greater than zero".to_string()));
        }

        let mut distances = vec![0.0f32; n * k];
        let mut positions = vec![0i64; n * k];
        if n > 0 {
            handle
                .search(n, queries, k, &mut distances, &mut positions)
                .map_err(VectorError::SearchFailed)?;
        }

        debug!(queries = n, k, "Search complete");
        Ok(SearchBatch {
            k,
            distances,
            positions,
        })
    }

    /// Search with a single embedding.
    pub fn search_one(&self, query: &Embedding, k: usize) -> Result<SearchBatch, VectorError> {
        if query.dimension() != self.dimensions {
            return Err(VectorError::DimensionMismatch {
                dimensions: self.dimensions,
                len: query.dimension(),
            });
        }
        self.search(&query.values, k)
    }

    /// Search with several embeddings in one batched call.
    pub fn search_many(&self, queries: &[Embedding], k: usize) -> Result<SearchBatch, VectorError> {
        let mut flat = Vec::with_capacity(queries.len() * self.dimensions);
        for query in queries {
            if query.dimension() != self.dimensions {
                return Err(VectorError::DimensionMismatch {
                    dimensions: self.dimensions,
                    len: query.dimension(),
                });
            }
            flat.extend_from_slice(&query.values);
        }
        self.search(&flat, k)
    }

    /// Free the native handle. Safe to call repeatedly.
    pub fn release(&mut self) {
        if self.handle.take().is_some() {
            info!(descriptor = %self.descriptor, "Released vector index");
        }
        self.state = IndexState::Released;
    }
}

impl Drop for VectorIndex {
    fn drop(&mut self) {
        self.release();
    }
}
