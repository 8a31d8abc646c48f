//! # semvec-vector
//!
//! Vector index lifecycle and nearest-neighbor search for semvec.
//!
//! Indexes are chosen from a closed set of variants, allocated through a
//! pluggable engine, and driven through a train/add/search/release state
//! machine. Raw engine positions are mapped back to content ids through an
//! insertion-ordered catalog.
//!
//! ## Features
//! - `Flat`, `FlatIP` and IVF-family indexes via the in-process exact engine
//! - `HNSWFlat` via usearch
//! - Batched multi-query search with per-entry error reporting
//! - `TextSearcher` tying an embedding model to an index

pub mod catalog;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod exact;
pub mod hnsw;
pub mod index;
pub mod pipeline;
pub mod results;

pub use catalog::ContentCatalog;
pub use descriptor::{IndexDescriptor, IndexKind};
pub use engine::{BuiltinEngine, EngineError, IndexEngine, NativeIndex, NO_MATCH};
pub use error::VectorError;
pub use exact::ExactEngine;
pub use hnsw::{HnswConfig, UsearchEngine};
pub use index::{IndexState, SearchBatch, VectorIndex};
pub use pipeline::{IndexingStats, TextSearcher};
pub use results::{
    assemble_batch, assemble_multi_query, assemble_single_query, query_label, SearchResult,
};
