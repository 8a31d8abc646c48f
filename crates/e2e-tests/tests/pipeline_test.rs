//! End-to-end text search pipeline tests.
//!
//! Text -> tokens -> pooled vector -> index -> ranked content ids, using the
//! deterministic hashing backend from the harness.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use e2e_tests::{sample_corpus, TestHarness, TEST_HIDDEN_SIZE};
use semvec_embeddings::EmbeddingModel;
use semvec_vector::{
    BuiltinEngine, IndexKind, IndexState, TextSearcher, VectorError, VectorIndex,
};

fn searcher(harness: &TestHarness, kind: IndexKind) -> TextSearcher<impl EmbeddingModel> {
    let extractor = Arc::new(harness.extractor());
    let index = VectorIndex::create(&BuiltinEngine::new(), TEST_HIDDEN_SIZE, kind.into())
        .expect("Failed to create index");
    TextSearcher::new(extractor, index).expect("Failed to build searcher")
}

/// Every indexed document, queried by its own text with k=1, comes back
/// at rank 1 with distance ~0.
#[test]
fn test_round_trip_every_document() {
    let harness = TestHarness::new();
    let corpus = sample_corpus();

    for kind in [IndexKind::Flat, IndexKind::IVFFlat, IndexKind::HNSWFlat] {
        let mut searcher = searcher(&harness, kind);
        let stats = searcher.index_documents(&corpus).unwrap();
        assert_eq!(stats.vectors_added, corpus.len(), "{kind}");
        assert_eq!(searcher.index().state(), IndexState::Populated);

        for (id, text) in &corpus {
            let results = searcher.search_text(text, 1).unwrap();
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].rank, 1);
            assert_eq!(results[0].content_id.as_ref(), Some(id), "{kind}: {text}");
            assert!(results[0].distance.abs() < 1e-4, "{kind}: {}", results[0].distance);
        }
    }
}

#[test]
fn test_results_are_ranked_by_distance() {
    let harness = TestHarness::new();
    let mut searcher = searcher(&harness, IndexKind::Flat);
    searcher.index_documents(&sample_corpus()).unwrap();

    let results = searcher.search_text("rust borrow checker", 5).unwrap();
    let ranks: Vec<usize> = results.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    for pair in results.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
    assert_eq!(results[0].content_id.as_deref(), Some("rust-1"));
}

#[test]
fn test_multi_query_batch() {
    let harness = TestHarness::new();
    let mut searcher = searcher(&harness, IndexKind::Flat);
    searcher.index_documents(&sample_corpus()).unwrap();

    let queries = ["tomato basil sauce", "neural network training", "rust borrow checker"];
    let results = searcher.search_texts(&queries, 2).unwrap();

    let labels: Vec<&str> = results.keys().map(|s| s.as_str()).collect();
    assert_eq!(labels, vec!["QUERY 1", "QUERY 2", "QUERY 3"]);

    assert_eq!(results["QUERY 1"][0].content_id.as_deref(), Some("food-3"));
    assert_eq!(results["QUERY 2"][0].content_id.as_deref(), Some("ml-1"));
    assert_eq!(results["QUERY 3"][0].content_id.as_deref(), Some("rust-1"));
    for list in results.values() {
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|r| r.error.is_none()));
    }
}

#[test]
fn test_k_larger_than_corpus_flags_missing_slots() {
    let harness = TestHarness::new();
    let mut searcher = searcher(&harness, IndexKind::Flat);
    let corpus = sample_corpus();
    searcher.index_documents(&corpus[..2]).unwrap();

    let results = searcher.search_text("pasta", 4).unwrap();
    assert_eq!(results.len(), 4);
    assert!(results[..2].iter().all(|r| r.content_id.is_some()));
    assert!(results[2..]
        .iter()
        .all(|r| r.content_id.is_none() && r.error.is_some()));
}

#[test]
fn test_incremental_indexing_keeps_positions_aligned() {
    let harness = TestHarness::new();
    let mut searcher = searcher(&harness, IndexKind::IVFSQ);
    let corpus = sample_corpus();

    searcher.index_documents(&corpus[..3]).unwrap();
    searcher.index_documents(&corpus[3..]).unwrap();
    assert_eq!(searcher.len(), corpus.len());
    assert_eq!(searcher.index().len(), corpus.len());

    let (last_id, last_text) = corpus.last().unwrap();
    let results = searcher.search_text(last_text, 1).unwrap();
    assert_eq!(results[0].content_id.as_ref(), Some(last_id));
}

#[test]
fn test_one_session_per_embedding() {
    let harness = TestHarness::new();
    let extractor = harness.extractor();
    for text in ["rust", "pasta", "neural"] {
        extractor.embed(text).unwrap();
    }
    assert_eq!(extractor.sessions().sessions_opened(), 3);
}

#[test]
fn test_release_ends_searching() {
    let harness = TestHarness::new();
    let mut searcher = searcher(&harness, IndexKind::Flat);
    searcher.index_documents(&sample_corpus()).unwrap();

    searcher.release();
    searcher.release();
    assert_eq!(searcher.index().state(), IndexState::Released);
    assert!(matches!(
        searcher.search_text("rust", 1),
        Err(VectorError::Disposed)
    ));
}
