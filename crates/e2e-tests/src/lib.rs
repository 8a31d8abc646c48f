//! End-to-end test infrastructure for semvec.
//!
//! Provides a shared TestHarness with a small on-disk vocabulary and a
//! deterministic inference backend, so the full text -> tokens -> vector ->
//! index -> ranked ids pipeline runs without downloading a model.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use semvec_embeddings::{
    EmbeddingError, EmbeddingExtractor, HiddenStates, InferenceSession, ModelInputs,
    PoolingMethod, SessionFactory, SubwordTokenizer, Vocabulary,
};

/// Hidden size of the hashing backend
pub const TEST_HIDDEN_SIZE: usize = 32;

/// Sequence length used by harness tokenizers
pub const TEST_MAX_LENGTH: usize = 24;

/// Vocabulary written by the harness, in id order.
pub const TEST_VOCAB: &[&str] = &[
    "[PAD]", "[UNK]", "[CLS]", "[SEP]", "rust", "borrow", "checker", "owner", "##ship", "memory",
    "safe", "##ty", "pasta", "sauce", "tomato", "basil", "cook", "##ing", "neural", "network",
    "train", "gradient", "model", "layer", "the", "and", "of", "a", "un", "##able", "play",
];

/// Three topic groups of documents, `(id, text)`.
pub fn sample_corpus() -> Vec<(String, String)> {
    [
        ("rust-1", "rust borrow checker"),
        ("rust-2", "rust ownership and memory safety"),
        ("rust-3", "the borrow checker of rust"),
        ("food-1", "pasta and tomato sauce"),
        ("food-2", "cooking pasta with basil"),
        ("food-3", "tomato basil sauce"),
        ("ml-1", "neural network training"),
        ("ml-2", "gradient of a model layer"),
        ("ml-3", "train the neural model"),
    ]
    .iter()
    .map(|(id, text)| (id.to_string(), text.to_string()))
    .collect()
}

/// Deterministic pseudo-random vector for a token id.
///
/// Position-independent, so mean pooling yields a bag-of-tokens embedding.
pub fn token_vector(id: u32, hidden_size: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(u64::from(id));
    (0..hidden_size).map(|_| rng.random_range(-1.0..1.0)).collect()
}

/// Session whose hidden state at each position is `token_vector(id)`.
pub struct HashingSession {
    hidden_size: usize,
}

impl InferenceSession for HashingSession {
    fn run(&self, inputs: &ModelInputs) -> Result<HiddenStates, EmbeddingError> {
        let values = inputs
            .input_ids
            .iter()
            .flat_map(|&id| token_vector(id, self.hidden_size))
            .collect();
        HiddenStates::new(inputs.seq_len(), self.hidden_size, values)
    }
}

/// Opens `HashingSession`s and counts how many were opened.
pub struct HashingSessionFactory {
    hidden_size: usize,
    opened: AtomicUsize,
}

impl HashingSessionFactory {
    pub fn new(hidden_size: usize) -> Self {
        Self {
            hidden_size,
            opened: AtomicUsize::new(0),
        }
    }

    pub fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl SessionFactory for HashingSessionFactory {
    fn model_name(&self) -> &str {
        "hashing-test-model"
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn open_session(&self) -> Result<Box<dyn InferenceSession>, EmbeddingError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(HashingSession {
            hidden_size: self.hidden_size,
        }))
    }
}

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// `vocab.txt` holding `TEST_VOCAB`
    pub vocab_txt_path: PathBuf,
    /// `tokenizer.json` holding the same tokens
    pub tokenizer_json_path: PathBuf,
}

impl TestHarness {
    /// Create a temp directory with both vocabulary formats written.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");

        let vocab_txt_path = temp_dir.path().join("vocab.txt");
        std::fs::write(&vocab_txt_path, TEST_VOCAB.join("\n")).expect("Failed to write vocab.txt");

        let vocab: serde_json::Map<String, serde_json::Value> = TEST_VOCAB
            .iter()
            .enumerate()
            .map(|(id, token)| (token.to_string(), serde_json::Value::from(id)))
            .collect();
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "model": { "type": "WordPiece", "unk_token": "[UNK]", "vocab": vocab }
        });
        let tokenizer_json_path = temp_dir.path().join("tokenizer.json");
        std::fs::write(&tokenizer_json_path, tokenizer_json.to_string())
            .expect("Failed to write tokenizer.json");

        Self {
            _temp_dir: temp_dir,
            vocab_txt_path,
            tokenizer_json_path,
        }
    }

    pub fn vocabulary(&self) -> Arc<Vocabulary> {
        Arc::new(Vocabulary::from_file(&self.vocab_txt_path).expect("Failed to load vocabulary"))
    }

    pub fn tokenizer(&self) -> SubwordTokenizer {
        SubwordTokenizer::new(self.vocabulary()).with_max_length(TEST_MAX_LENGTH)
    }

    /// Extractor over the hashing backend with mean pooling.
    pub fn extractor(&self) -> EmbeddingExtractor<HashingSessionFactory> {
        EmbeddingExtractor::new(self.tokenizer(), HashingSessionFactory::new(TEST_HIDDEN_SIZE))
            .with_pooling(PoolingMethod::MeanPooling)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `(id, text)` pairs as a JSONL corpus inside `dir`.
pub fn write_corpus(dir: &std::path::Path, documents: &[(String, String)]) -> PathBuf {
    let lines: Vec<String> = documents
        .iter()
        .map(|(id, text)| serde_json::json!({ "id": id, "text": text }).to_string())
        .collect();
    let path = dir.join("corpus.jsonl");
    std::fs::write(&path, lines.join("\n")).expect("Failed to write corpus");
    path
}
