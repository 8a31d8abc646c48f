//! Text search pipeline.
//!
//! Embeds documents, keeps the catalog and index in lockstep, and answers
//! free-text queries with ranked content ids.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use semvec_embeddings::{Embedding, EmbeddingModel};
use tracing::{debug, info};

use crate::catalog::ContentCatalog;
use crate::error::VectorError;
use crate::index::VectorIndex;
use crate::results::{assemble_batch, assemble_single_query, SearchResult};

/// Statistics from one indexing call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexingStats {
    /// Number of documents looked at
    pub documents_processed: usize,
    /// Number of vectors added to the index
    pub vectors_added: usize,
    /// Documents skipped (duplicate id or blank text)
    pub documents_skipped: usize,
}

/// Couples an embedding model with an index and its catalog.
pub struct TextSearcher<E: EmbeddingModel> {
    embedder: Arc<E>,
    index: VectorIndex,
    catalog: ContentCatalog<String>,
}

impl<E: EmbeddingModel> TextSearcher<E> {
    /// Wrap an empty index whose dimensionality matches the model.
    pub fn new(embedder: Arc<E>, index: VectorIndex) -> Result<Self, VectorError> {
        let model_dim = embedder.info().dimension;
        if index.dimensions() != model_dim {
            return Err(VectorError::InvalidArgument(format!(
                "index dimension {} does not match model dimension {}",
                index.dimensions(),
                model_dim
            )));
        }
        if !index.is_empty() {
            return Err(VectorError::InvalidArgument(
                "index must be empty so positions line up with the catalog".to_string(),
            ));
        }
        Ok(Self {
            embedder,
            index,
            catalog: ContentCatalog::new(),
        })
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn catalog(&self) -> &ContentCatalog<String> {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Embed and index `(id, text)` pairs.
    ///
    /// Trains the index first when its variant needs it, using everything
    /// in the catalog plus this batch. The catalog only grows once the
    /// index has accepted the vectors.
    pub fn index_documents<S, T>(&mut self, documents: &[(S, T)]) -> Result<IndexingStats, VectorError>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut stats = IndexingStats::default();
        let mut seen = HashSet::new();
        let mut pending: Vec<(String, Embedding)> = Vec::new();

        for (id, text) in documents {
            let (id, text) = (id.as_ref(), text.as_ref());
            stats.documents_processed += 1;

            if self.catalog.position_of(&id.to_string()).is_some() || !seen.insert(id) {
                debug!(doc_id = %id, "Already indexed, skipping");
                stats.documents_skipped += 1;
                continue;
            }
            if text.trim().is_empty() {
                debug!(doc_id = %id, "Empty text, skipping");
                stats.documents_skipped += 1;
                continue;
            }

            let embedding = self.embedder.embed(text)?;
            if embedding.dimension() != self.index.dimensions() {
                return Err(VectorError::DimensionMismatch {
                    dimensions: self.index.dimensions(),
                    len: embedding.dimension(),
                });
            }
            pending.push((id.to_string(), embedding));
        }

        if pending.is_empty() {
            return Ok(stats);
        }

        let flat: Vec<f32> = pending
            .iter()
            .flat_map(|(_, embedding)| embedding.values.iter().copied())
            .collect();

        if self.index.descriptor().requires_training() && !self.index.is_trained() {
            let mut training = self.catalog.flatten();
            training.extend_from_slice(&flat);
            self.index.train(&training)?;
        }

        let positions = self.index.add(&flat)?;
        for (id, embedding) in pending {
            self.catalog.insert(id, embedding)?;
        }
        stats.vectors_added = positions.len();

        info!(
            processed = stats.documents_processed,
            added = stats.vectors_added,
            skipped = stats.documents_skipped,
            total = self.catalog.len(),
            "Indexed documents"
        );
        Ok(stats)
    }

    /// Top-`k` documents for one query.
    pub fn search_text(&self, query: &str, k: usize) -> Result<Vec<SearchResult<String>>, VectorError> {
        let embedding = self.embedder.embed(query)?;
        let batch = self.index.search_one(&embedding, k)?;
        assemble_single_query(&self.catalog, &batch.positions, &batch.distances)
    }

    /// Top-`k` documents per query, labelled `QUERY 1..n`, in one batched search.
    pub fn search_texts<S: AsRef<str>>(
        &self,
        queries: &[S],
        k: usize,
    ) -> Result<IndexMap<String, Vec<SearchResult<String>>>, VectorError> {
        let refs: Vec<&str> = queries.iter().map(|q| q.as_ref()).collect();
        let embeddings = self.embedder.embed_batch(&refs)?;
        let batch = self.index.search_many(&embeddings, k)?;
        assemble_batch(&self.catalog, &batch)
    }

    /// Free the underlying index.
    pub fn release(&mut self) {
        self.index.release();
    }
}
