//! # semvec-embeddings
//!
//! Text-to-vector pipeline for semvec.
//!
//! Raw text is lower-cased, split on whitespace and segmented into WordPiece
//! units against a fixed vocabulary, then padded to a fixed length with an
//! attention mask. A BERT-family model (run through Candle) turns the sequence
//! into per-token hidden states, which are pooled into one vector.
//!
//! ## Features
//! - `tokenizer.json` and `vocab.txt` vocabularies
//! - CLS-token and mean pooling
//! - Pluggable inference backend via `SessionFactory`
//! - Model files cached locally, fetched from the Hugging Face Hub on demand

pub mod cache;
pub mod candle;
pub mod error;
pub mod extractor;
pub mod inference;
pub mod model;
pub mod pooling;
pub mod tokenizer;
pub mod vocab;
pub mod wordpiece;

pub use crate::candle::CandleSessionFactory;
pub use cache::{get_or_download_model, ModelCache, ModelPaths, MODEL_FILES};
pub use error::EmbeddingError;
pub use extractor::EmbeddingExtractor;
pub use inference::{HiddenStates, InferenceSession, ModelInputs, SessionFactory};
pub use model::{Embedding, EmbeddingModel, ModelInfo};
pub use pooling::{cls_pooling, mean_pooling, PoolingMethod};
pub use tokenizer::{SubwordTokenizer, TokenSequence, DEFAULT_MAX_LENGTH};
pub use vocab::{Vocabulary, CLS_TOKEN, PAD_TOKEN, SEP_TOKEN, UNK_TOKEN};
pub use wordpiece::segment_word;
