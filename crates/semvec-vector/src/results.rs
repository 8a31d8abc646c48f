//! Result assembly.
//!
//! Turns raw engine positions and distances into ranked results keyed by
//! content id. Positions outside the catalog become per-entry error results
//! instead of failing the whole batch.

use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::catalog::ContentCatalog;
use crate::error::VectorError;
use crate::index::SearchBatch;

/// One ranked neighbor.
///
/// `content_id` is `None` when the engine returned a position with no
/// catalog entry; `error` then says which one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult<K> {
    pub rank: usize,
    pub content_id: Option<K>,
    pub distance: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<K> SearchResult<K> {
    pub fn is_valid(&self) -> bool {
        self.content_id.is_some()
    }
}

/// Label for the `i`-th query (0-based) of a batch.
pub fn query_label(i: usize) -> String {
    format!("QUERY {}", i + 1)
}

fn resolve<K>(catalog: &ContentCatalog<K>, rank: usize, position: i64, distance: f32) -> SearchResult<K>
where
    K: Hash + Eq + Debug + Clone,
{
    match catalog.id_at(position) {
        Some(id) => SearchResult {
            rank,
            content_id: Some(id.clone()),
            distance,
            error: None,
        },
        None => {
            warn!(position, catalog_len = catalog.len(), "Invalid document index in search result");
            SearchResult {
                rank,
                content_id: None,
                distance,
                error: Some(format!("Invalid document index: {position}")),
            }
        }
    }
}

/// Ranked results for one query. Ranks start at 1.
///
/// Every position yields exactly one result, so `distances` must be the
/// same length as `positions`.
pub fn assemble_single_query<K>(
    catalog: &ContentCatalog<K>,
    positions: &[i64],
    distances: &[f32],
) -> Result<Vec<SearchResult<K>>, VectorError>
where
    K: Hash + Eq + Debug + Clone,
{
    if positions.len() != distances.len() {
        return Err(VectorError::InvalidArgument(format!(
            "{} positions but {} distances",
            positions.len(),
            distances.len()
        )));
    }

    Ok(positions
        .iter()
        .zip(distances)
        .enumerate()
        .map(|(i, (&position, &distance))| resolve(catalog, i + 1, position, distance))
        .collect())
}

/// Ranked results per query, in query order, labelled `QUERY 1..n`.
///
/// `positions` and `distances` are query-major blocks of `k` entries; both
/// must hold the same whole number of blocks.
pub fn assemble_multi_query<K>(
    catalog: &ContentCatalog<K>,
    k: usize,
    positions: &[i64],
    distances: &[f32],
) -> Result<IndexMap<String, Vec<SearchResult<K>>>, VectorError>
where
    K: Hash + Eq + Debug + Clone,
{
    if k == 0 {
        return Err(VectorError::InvalidArgument("k must be at least 1".to_string()));
    }
    if positions.len() != distances.len() {
        return Err(VectorError::InvalidArgument(format!(
            "{} positions but {} distances",
            positions.len(),
            distances.len()
        )));
    }
    if positions.len() % k != 0 {
        return Err(VectorError::InvalidArgument(format!(
            "{} results do not split into blocks of k={k}",
            positions.len()
        )));
    }

    let mut out = IndexMap::with_capacity(positions.len() / k);
    let blocks = positions.chunks_exact(k).zip(distances.chunks_exact(k));
    for (q, (pos_block, dist_block)) in blocks.enumerate() {
        out.insert(query_label(q), assemble_single_query(catalog, pos_block, dist_block)?);
    }
    Ok(out)
}

/// Convenience over a whole `SearchBatch`.
pub fn assemble_batch<K>(
    catalog: &ContentCatalog<K>,
    batch: &SearchBatch,
) -> Result<IndexMap<String, Vec<SearchResult<K>>>, VectorError>
where
    K: Hash + Eq + Debug + Clone,
{
    assemble_multi_query(catalog, batch.k, &batch.positions, &batch.distances)
}
