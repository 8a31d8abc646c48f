//! In-process exhaustive engine.
//!
//! Stores vectors verbatim and scans all of them per query. `Flat` and the
//! IVF family rank by squared L2 distance (ascending), `FlatIP` by inner
//! product (descending). IVF variants insist on a training pass before
//! accepting vectors but keep exact storage, so results match `Flat`.

use tracing::debug;

use crate::engine::{EngineError, IndexEngine, NativeIndex, NO_MATCH};

const ERR_INVALID: i32 = 1;
const ERR_UNTRAINED: i32 = 2;
const ERR_BUFFER: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    L2,
    InnerProduct,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExactEngine;

impl ExactEngine {
    fn layout(factory: &str) -> Option<(Metric, bool)> {
        match factory {
            "Flat" => Some((Metric::L2, false)),
            "FlatIP" => Some((Metric::InnerProduct, false)),
            "IVFFlat" | "IVFPQ" | "IVFSQ" => Some((Metric::L2, true)),
            _ => None,
        }
    }
}

impl IndexEngine for ExactEngine {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn supports(&self, factory: &str) -> bool {
        Self::layout(factory).is_some()
    }

    fn create(&self, dimensions: usize, factory: &str) -> Result<Box<dyn NativeIndex>, EngineError> {
        let (metric, needs_training) = Self::layout(factory).ok_or_else(|| {
            EngineError::new(ERR_INVALID, format!("unsupported factory string: {factory}"))
        })?;
        if dimensions == 0 {
            return Err(EngineError::new(ERR_INVALID, "dimensions must be > 0"));
        }

        debug!(factory, dimensions, "Created exact index");
        Ok(Box::new(ExactIndex {
            dimensions,
            metric,
            trained: !needs_training,
            data: Vec::new(),
        }))
    }
}

struct ExactIndex {
    dimensions: usize,
    metric: Metric,
    trained: bool,
    data: Vec<f32>,
}

impl ExactIndex {
    fn check_buffer(&self, n: usize, buf: &[f32]) -> Result<(), EngineError> {
        if buf.len() != n * self.dimensions {
            return Err(EngineError::new(
                ERR_BUFFER,
                format!(
                    "expected {} floats for {} vectors of dimension {}, got {}",
                    n * self.dimensions,
                    n,
                    self.dimensions,
                    buf.len()
                ),
            ));
        }
        Ok(())
    }

    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            Metric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
            Metric::InnerProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        }
    }
}

impl NativeIndex for ExactIndex {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn is_trained(&self) -> bool {
        self.trained
    }

    fn ntotal(&self) -> usize {
        self.data.len() / self.dimensions
    }

    fn train(&mut self, n: usize, vectors: &[f32]) -> Result<(), EngineError> {
        if n == 0 {
            return Err(EngineError::new(ERR_INVALID, "no training vectors"));
        }
        self.check_buffer(n, vectors)?;
        self.trained = true;
        Ok(())
    }

    fn add(&mut self, n: usize, vectors: &[f32]) -> Result<(), EngineError> {
        if !self.trained {
            return Err(EngineError::new(ERR_UNTRAINED, "index is not trained"));
        }
        self.check_buffer(n, vectors)?;
        self.data.extend_from_slice(vectors);
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

        let empty_slot = match self.metric {
            Metric::L2 => f32::INFINITY,
            Metric::InnerProduct => f32::NEG_INFINITY,
        };

        for (q, query) in queries.chunks_exact(self.dimensions).enumerate() {
            let mut scored: Vec<(usize, f32)> = self
                .data
                .chunks_exact(self.dimensions)
                .map(|stored| self.score(query, stored))
                .enumerate()
                .collect();

            match self.metric {
                Metric::L2 => scored.sort_by(|a, b| a.1.total_cmp(&b.1)),
                Metric::InnerProduct => scored.sort_by(|a, b| b.1.total_cmp(&a.1)),
            }

            let out = q * k..(q + 1) * k;
            for (slot, i) in out.enumerate() {
                match scored.get(slot) {
                    Some(&(pos, dist)) => {
                        labels[i] = pos as i64;
                        distances[i] = dist;
                    }
                    None => {
                        labels[i] = NO_MATCH;
                        distances[i] = empty_slot;
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

    fn search(index: &dyn NativeIndex, queries: &[f32], k: usize) -> (Vec<f32>, Vec<i64>) {
        let n = queries.len() / index.dimensions();
        let mut d = vec![0.0; n * k];
        let mut l = vec![0; n * k];
        index.search(n, queries, k, &mut d, &mut l).unwrap();
        (d, l)
    }

    #[test]
    fn test_flat_l2_ordering() {
        let mut index = ExactEngine.create(2, "Flat").unwrap();
        index.add(3, &[0.0, 0.0, 1.0, 0.0, 5.0, 5.0]).unwrap();
        assert_eq!(index.ntotal(), 3);

        let (d, l) = search(index.as_ref(), &[0.9, 0.0], 2);
        assert_eq!(l, vec![1, 0]);
        assert!((d[0] - 0.01).abs() < 1e-5);
        assert!((d[1] - 0.81).abs() < 1e-5);
    }

    #[test]
    fn test_flat_ip_prefers_largest_product() {
        let mut index = ExactEngine.create(2, "FlatIP").unwrap();
        index.add(2, &[1.0, 0.0, 3.0, 0.0]).unwrap();
        let (d, l) = search(index.as_ref(), &[1.0, 0.0], 2);
        assert_eq!(l, vec![1, 0]);
        assert_eq!(d, vec![3.0, 1.0]);
    }

    #[test]
    fn test_missing_neighbors_are_sentinel() {
        let mut index = ExactEngine.create(1, "Flat").unwrap();
        index.add(1, &[2.0]).unwrap();
        let (d, l) = search(index.as_ref(), &[2.0], 3);
        assert_eq!(l, vec![0, NO_MATCH, NO_MATCH]);
        assert_eq!(d[0], 0.0);
        assert!(d[1].is_infinite());
    }

    #[test]
    fn test_ivf_requires_training() {
        let mut index = ExactEngine.create(2, "IVFFlat").unwrap();
        assert!(!index.is_trained());
        let err = index.add(1, &[1.0, 1.0]).unwrap_err();
        assert_eq!(err.code, ERR_UNTRAINED);

        index.train(2, &[0.0, 0.0, 1.0, 1.0]).unwrap();
        assert!(index.is_trained());
        index.add(1, &[1.0, 1.0]).unwrap();
        assert_eq!(index.ntotal(), 1);
    }

    #[test]
    fn test_rejects_bad_buffers() {
        let mut index = ExactEngine.create(2, "Flat").unwrap();
        assert_eq!(index.add(2, &[1.0, 2.0, 3.0]).unwrap_err().code, ERR_BUFFER);
        assert_eq!(index.train(0, &[]).unwrap_err().code, ERR_INVALID);
    }

    #[test]
    fn test_create_validation() {
        assert!(ExactEngine.create(0, "Flat").is_err());
        assert!(ExactEngine.create(4, "HNSWFlat").is_err());
        assert!(!ExactEngine.supports("LSH"));
    }
}
