//! Corpus loading as used by `semvec search`, driven through the pipeline.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use e2e_tests::{sample_corpus, write_corpus, TestHarness, TEST_HIDDEN_SIZE};
use semvec_cli::load_corpus;
use semvec_vector::{BuiltinEngine, IndexDescriptor, TextSearcher, VectorIndex};

#[test]
fn test_jsonl_corpus_search() {
    let harness = TestHarness::new();
    let temp = tempfile::TempDir::new().unwrap();
    let path = write_corpus(temp.path(), &sample_corpus());

    let documents = load_corpus(&path).unwrap();
    assert_eq!(documents.len(), sample_corpus().len());
    assert_eq!(documents[0].id, "rust-1");

    let descriptor: IndexDescriptor = "hnswflat".parse().unwrap();
    let index = VectorIndex::create(&BuiltinEngine::new(), TEST_HIDDEN_SIZE, descriptor).unwrap();
    let mut searcher = TextSearcher::new(Arc::new(harness.extractor()), index).unwrap();

    let pairs: Vec<(&str, &str)> = documents
        .iter()
        .map(|d| (d.id.as_str(), d.text.as_str()))
        .collect();
    searcher.index_documents(&pairs).unwrap();

    let results = searcher.search_text("cooking pasta with basil", 1).unwrap();
    assert_eq!(results[0].content_id.as_deref(), Some("food-2"));

    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json[0]["rank"], 1);
    assert_eq!(json[0]["content_id"], "food-2");
}

#[test]
fn test_malformed_corpus_is_rejected() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("bad.jsonl");
    std::fs::write(&path, "{\"id\": \"a\", \"text\": \"ok\"}\nnot json\n").unwrap();

    let err = load_corpus(&path).unwrap_err();
    assert!(format!("{err:#}").contains(":2:"));
}
