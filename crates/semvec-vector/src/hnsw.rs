//! HNSW engine backed by usearch.
//!
//! Parameters tuned for quality over speed:
//! - M = 16 (connections per layer)
//! - ef_construction = 200 (build-time quality)
//! - ef_search = 100 (search-time quality)
//!
//! Keys are insertion positions, distances are squared L2.

use tracing::{debug, info};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::engine::{EngineError, IndexEngine, NativeIndex, NO_MATCH};

const ERR_USEARCH: i32 = 10;
const ERR_BUFFER: i32 = 11;

/// HNSW graph configuration
#[derive(Debug, Clone)]
pub struct HnswConfig {
    /// Number of connections per layer (M parameter)
    pub connectivity: usize,
    /// Build-time search depth (ef_construction)
    pub expansion_add: usize,
    /// Query-time search depth (ef_search)
    pub expansion_search: usize,
    /// Initial reservation; grows on demand
    pub capacity: usize,
}

impl Default for HnswConfig {
    fn default() -> Self {
        Self {
            connectivity: 16,
            expansion_add: 200,
            expansion_search: 100,
            capacity: 1024,
        }
    }
}

impl HnswConfig {
    pub fn with_connectivity(mut self, m: usize) -> Self {
        self.connectivity = m;
        self
    }

    pub fn with_expansion(mut self, ef_add: usize, ef_search: usize) -> Self {
        self.expansion_add = ef_add;
        self.expansion_search = ef_search;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Creates `HNSWFlat` indexes.
#[derive(Debug, Clone, Default)]
pub struct UsearchEngine {
    config: HnswConfig,
}

impl UsearchEngine {
    pub fn new(config: HnswConfig) -> Self {
        Self { config }
    }
}

impl IndexEngine for UsearchEngine {
    fn name(&self) -> &'static str {
        "usearch"
    }

    fn supports(&self, factory: &str) -> bool {
        factory == "HNSWFlat"
    }

    fn create(&self, dimensions: usize, factory: &str) -> Result<Box<dyn NativeIndex>, EngineError> {
        if !self.supports(factory) {
            return Err(EngineError::new(
                ERR_USEARCH,
                format!("unsupported factory string: {factory}"),
            ));
        }
        if dimensions == 0 {
            return Err(EngineError::new(ERR_USEARCH, "dimensions must be > 0"));
        }

        let options = IndexOptions {
            dimensions,
            metric: MetricKind::L2sq,
            quantization: ScalarKind::F32,
            connectivity: self.config.connectivity,
            expansion_add: self.config.expansion_add,
            expansion_search: self.config.expansion_search,
            multi: false,
        };

        let index = Index::new(&options).map_err(|e| EngineError::new(ERR_USEARCH, e.to_string()))?;
        index
            .reserve(self.config.capacity)
            .map_err(|e| EngineError::new(ERR_USEARCH, e.to_string()))?;

        info!(dim = dimensions, m = self.config.connectivity, "Created HNSW index");
        Ok(Box::new(HnswIndex { index, dimensions }))
    }
}

struct HnswIndex {
    index: Index,
    dimensions: usize,
}

impl HnswIndex {
    fn check_buffer(&self, n: usize, buf: &[f32]) -> Result<(), EngineError> {
        if buf.len() != n * self.dimensions {
            return Err(EngineError::new(
                ERR_BUFFER,
                format!("expected {} floats, got {}", n * self.dimensions, buf.len()),
            ));
        }
        Ok(())
    }
}

impl NativeIndex for HnswIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn is_trained(&self) -> bool {
        true
    }

    fn ntotal(&self) -> usize {
        self.index.size()
    }

    fn train(&mut self, n: usize, vectors: &[f32]) -> Result<(), EngineError> {
        // Graph indexes learn nothing up front
        self.check_buffer(n, vectors)
    }

    fn add(&mut self, n: usize, vectors: &[f32]) -> Result<(), EngineError> {
        self.check_buffer(n, vectors)?;

        let start = self.index.size();
        let needed = start + n;
        if needed > self.index.capacity() {
            let grown = needed.max(self.index.capacity() * 2);
            self.index
                .reserve(grown)
                .map_err(|e| EngineError::new(ERR_USEARCH, e.to_string()))?;
        }

        for (offset, vector) in vectors.chunks_exact(self.dimensions).enumerate() {
            let key = (start + offset) as u64;
            self.index
                .add(key, vector)
                .map_err(|e| EngineError::new(ERR_USEARCH, e.to_string()))?;
        }

        debug!(added = n, total = self.index.size(), "Added vectors");
        Ok(())
    }

    fn search(
        &self,
        n: usize,
        queries: &[f32],
        k: usize,
        distances: &mut [f32],
        labels: &mut [i64],
    ) -> Result<(), EngineError> {
        self.check_buffer(n, queries)?;
        if distances.len() < n * k || labels.len() < n * k {
            return Err(EngineError::new(ERR_BUFFER, "result buffers too small"));
        }

        for (q, query) in queries.chunks_exact(self.dimensions).enumerate() {
            let matches = self
                .index
                .search(query, k)
                .map_err(|e| EngineError::new(ERR_USEARCH, e.to_string()))?;

            for slot in 0..k {
                let i = q * k + slot;
                match (matches.keys.get(slot), matches.distances.get(slot)) {
                    (Some(&key), Some(&dist)) => {
                        labels[i] = key as i64;
                        distances[i] = dist;
                    }
                    _ => {
                        labels[i] = NO_MATCH;
                        distances[i] = f32::INFINITY;
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn random_vectors(n: usize, dim: usize) -> Vec<f32> {
        use rand::Rng;
        let mut rng = rand::rng();
        (0..n * dim).map(|_| rng.random()).collect()
    }

    #[test]
    fn test_create_index() {
        let index = UsearchEngine::default().create(64, "HNSWFlat").unwrap();
        assert_eq!(index.dimensions(), 64);
        assert_eq!(index.ntotal(), 0);
        assert!(index.is_trained());
    }

    #[test]
    fn test_add_and_search_finds_self() {
        let engine = UsearchEngine::new(HnswConfig::default().with_capacity(4));
        let mut index = engine.create(16, "HNSWFlat").unwrap();

        // More vectors than the initial reservation
        let data = random_vectors(10, 16);
        index.add(10, &data).unwrap();
        assert_eq!(index.ntotal(), 10);

        let query = &data[3 * 16..4 * 16];
        let mut distances = vec![0.0; 3];
        let mut labels = vec![0; 3];
        index.search(1, query, 3, &mut distances, &mut labels).unwrap();

        assert_eq!(labels[0], 3);
        assert!(distances[0].abs() < 1e-4);
        for i in 1..3 {
            assert!(distances[i - 1] <= distances[i]);
        }
    }

    #[test]
    fn test_empty_index_returns_sentinels() {
        let index = UsearchEngine::default().create(4, "HNSWFlat").unwrap();
        let mut distances = vec![0.0; 2];
        let mut labels = vec![0; 2];
        index
            .search(1, &[0.0; 4], 2, &mut distances, &mut labels)
            .unwrap();
        assert_eq!(labels, vec![NO_MATCH, NO_MATCH]);
    }

    #[test]
    fn test_rejects_other_factories() {
        assert!(UsearchEngine::default().create(4, "Flat").is_err());
    }
}
