//! Vocabulary store.
//!
//! Maps subword tokens to model ids. Loaded once from either a Hugging Face
//! `tokenizer.json` (the `model.vocab` object) or a BERT `vocab.txt`
//! (one token per line, id = line number), immutable afterwards.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::EmbeddingError;

/// Unknown-token fallback
pub const UNK_TOKEN: &str = "[UNK]";
/// Padding token
pub const PAD_TOKEN: &str = "[PAD]";
/// Sequence start marker
pub const CLS_TOKEN: &str = "[CLS]";
/// Sequence end marker
pub const SEP_TOKEN: &str = "[SEP]";

#[derive(Deserialize)]
struct TokenizerFile {
    model: TokenizerModel,
}

#[derive(Deserialize)]
struct TokenizerModel {
    vocab: HashMap<String, u32>,
}

/// Token -> id lookup with `[UNK]` fallback.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    tokens: HashMap<String, u32>,
    unk_id: u32,
    pad_id: u32,
}

impl Vocabulary {
    /// Build from an in-memory map. Fails if `[UNK]` or `[PAD]` is missing.
    pub fn from_map(tokens: HashMap<String, u32>) -> Result<Self, EmbeddingError> {
        let unk_id = *tokens.get(UNK_TOKEN).ok_or_else(|| {
            EmbeddingError::Config(format!("vocabulary has no {UNK_TOKEN} entry"))
        })?;
        let pad_id = *tokens.get(PAD_TOKEN).ok_or_else(|| {
            EmbeddingError::Config(format!("vocabulary has no {PAD_TOKEN} entry"))
        })?;

        Ok(Self {
            tokens,
            unk_id,
            pad_id,
        })
    }

    /// Load a vocabulary file. `.txt` files are read as one token per line,
    /// anything else as tokenizer JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EmbeddingError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EmbeddingError::Config(format!("cannot read vocabulary {}: {}", path.display(), e))
        })?;

        let vocab = if path.extension().is_some_and(|ext| ext == "txt") {
            Self::from_vocab_txt(&contents)?
        } else {
            Self::from_tokenizer_json(&contents)?
        };

        info!(path = ?path, tokens = vocab.len(), "Loaded vocabulary");
        Ok(vocab)
    }

    /// Parse the `model.vocab` object of a tokenizer.json document.
    pub fn from_tokenizer_json(json: &str) -> Result<Self, EmbeddingError> {
        let file: TokenizerFile = serde_json::from_str(json)
            .map_err(|e| EmbeddingError::Config(format!("malformed tokenizer json: {e}")))?;
        Self::from_map(file.model.vocab)
    }

    /// Parse a newline-delimited vocab.txt.
    pub fn from_vocab_txt(text: &str) -> Result<Self, EmbeddingError> {
        let mut tokens = HashMap::new();
        for (id, line) in text.lines().enumerate() {
            let token = line.trim_end_matches('\r');
            if token.is_empty() {
                continue;
            }
            let id = u32::try_from(id)
                .map_err(|_| EmbeddingError::Config("vocabulary too large".to_string()))?;
            tokens.entry(token.to_string()).or_insert(id);
        }
        debug!(tokens = tokens.len(), "Parsed vocab.txt");
        Self::from_map(tokens)
    }

    /// Id for `token`, or the `[UNK]` id when absent.
    pub fn lookup(&self, token: &str) -> u32 {
        self.tokens.get(token).copied().unwrap_or(self.unk_id)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn unk_id(&self) -> u32 {
        self.unk_id
    }

    pub fn pad_id(&self) -> u32 {
        self.pad_id
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
