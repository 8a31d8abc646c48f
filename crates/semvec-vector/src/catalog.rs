//! Content catalog.
//!
//! Maps content ids to their embeddings in insertion order. The `p`-th entry
//! here must be the `p`-th vector added to the index it is paired with; the
//! result assembler relies on that to turn positions back into ids.

use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexMap;
use semvec_embeddings::Embedding;

use crate::error::VectorError;

#[derive(Debug, Clone)]
pub struct ContentCatalog<K> {
    entries: IndexMap<K, Embedding>,
    dimension: Option<usize>,
}

impl<K> Default for ContentCatalog<K> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            dimension: None,
        }
    }
}

impl<K: Hash + Eq + Debug> ContentCatalog<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; returns its insertion position.
    ///
    /// Rejects duplicate ids and embeddings whose dimension differs from the
    /// first entry.
    pub fn insert(&mut self, id: K, embedding: Embedding) -> Result<usize, VectorError> {
        if self.entries.contains_key(&id) {
            return Err(VectorError::InvalidArgument(format!(
                "duplicate content id: {id:?}"
            )));
        }
        if embedding.is_empty() {
            return Err(VectorError::InvalidArgument(format!(
                "empty embedding for content id: {id:?}"
            )));
        }
        match self.dimension {
            Some(dim) if dim != embedding.dimension() => {
                return Err(VectorError::DimensionMismatch {
                    dimensions: dim,
                    len: embedding.dimension(),
                });
            }
            _ => self.dimension = Some(embedding.dimension()),
        }

        let (position, _) = self.entries.insert_full(id, embedding);
        Ok(position)
    }

    pub fn get(&self, id: &K) -> Option<&Embedding> {
        self.entries.get(id)
    }

    /// Content id at an engine position; `None` when out of range.
    pub fn id_at(&self, position: i64) -> Option<&K> {
        usize::try_from(position)
            .ok()
            .and_then(|p| self.entries.get_index(p))
            .map(|(id, _)| id)
    }

    pub fn get_index(&self, position: usize) -> Option<(&K, &Embedding)> {
        self.entries.get_index(position)
    }

    pub fn position_of(&self, id: &K) -> Option<usize> {
        self.entries.get_index_of(id)
    }
}

impl<K> ContentCatalog<K> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shared embedding dimension, once the first entry is in.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Embedding)> {
        self.entries.iter()
    }

    /// All embeddings concatenated in catalog order.
    pub fn flatten(&self) -> Vec<f32> {
        self.flatten_from(0)
    }

    /// Embeddings from `start` onward, concatenated in catalog order.
    pub fn flatten_from(&self, start: usize) -> Vec<f32> {
        let dim = self.dimension.unwrap_or(0);
        let mut flat = Vec::with_capacity(self.len().saturating_sub(start) * dim);
        for (_, embedding) in self.entries.iter().skip(start) {
            flat.extend_from_slice(&embedding.values);
        }
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: &[f32]) -> Embedding {
        Embedding::new(values.to_vec())
    }

    #[test]
    fn test_insert_assigns_positions() {
        let mut catalog = ContentCatalog::new();
        assert_eq!(catalog.insert("a".to_string(), emb(&[1.0, 0.0])).unwrap(), 0);
        assert_eq!(catalog.insert("b".to_string(), emb(&[0.0, 1.0])).unwrap(), 1);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.dimension(), Some(2));
        assert_eq!(catalog.position_of(&"b".to_string()), Some(1));
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut catalog = ContentCatalog::new();
        catalog.insert(7u64, emb(&[1.0])).unwrap();
        let err = catalog.insert(7u64, emb(&[2.0])).unwrap_err();
        assert!(matches!(err, VectorError::InvalidArgument(_)));
        assert_eq!(catalog.get(&7).unwrap().values, vec![1.0]);
    }

    #[test]
    fn test_rejects_inconsistent_dimension() {
        let mut catalog = ContentCatalog::new();
        catalog.insert(1u32, emb(&[1.0, 2.0])).unwrap();
        let err = catalog.insert(2u32, emb(&[1.0, 2.0, 3.0])).unwrap_err();
        assert!(matches!(err, VectorError::DimensionMismatch { dimensions: 2, len: 3 }));
        assert!(catalog.insert(3u32, Embedding::empty()).is_err());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_id_at_bounds() {
        let mut catalog = ContentCatalog::new();
        catalog.insert("x", emb(&[1.0])).unwrap();
        catalog.insert("y", emb(&[2.0])).unwrap();
        assert_eq!(catalog.id_at(1), Some(&"y"));
        assert_eq!(catalog.id_at(2), None);
        assert_eq!(catalog.id_at(-1), None);
    }

    #[test]
    fn test_flatten_in_insertion_order() {
        let mut catalog = ContentCatalog::new();
        catalog.insert("z", emb(&[3.0, 3.0])).unwrap();
        catalog.insert("a", emb(&[1.0, 1.0])).unwrap();
        assert_eq!(catalog.flatten(), vec![3.0, 3.0, 1.0, 1.0]);
        assert_eq!(catalog.flatten_from(1), vec![1.0, 1.0]);
        assert!(catalog.flatten_from(5).is_empty());
    }
}
