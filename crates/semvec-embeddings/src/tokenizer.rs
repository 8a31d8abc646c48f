//! Fixed-length subword tokenizer.
//!
//! Produces `[CLS] pieces... [SEP] [PAD]...` truncated or padded to an exact
//! length, plus the matching attention mask.

use std::sync::Arc;

use crate::vocab::{Vocabulary, CLS_TOKEN, SEP_TOKEN};
use crate::wordpiece::segment_word;

/// Default sequence length
pub const DEFAULT_MAX_LENGTH: usize = 128;

/// Token ids and attention mask of identical length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSequence {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

impl TokenSequence {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Number of unmasked positions.
    pub fn real_tokens(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

/// WordPiece tokenizer over a shared vocabulary.
#[derive(Debug, Clone)]
pub struct SubwordTokenizer {
    vocab: Arc<Vocabulary>,
    max_length: usize,
}

impl SubwordTokenizer {
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        Self {
            vocab,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Tokenize with the configured length.
    pub fn encode(&self, text: &str) -> TokenSequence {
        self.tokenize(text, self.max_length)
    }

    /// Tokenize `text` into exactly `max_length` ids.
    ///
    /// The mask is derived from the ids after padding: any position holding
    /// the pad id reads 0.
    pub fn tokenize(&self, text: &str, max_length: usize) -> TokenSequence {
        let mut tokens = vec![CLS_TOKEN.to_string()];
        for word in text.to_lowercase().split_whitespace() {
            tokens.extend(segment_word(word, &self.vocab));
        }
        tokens.push(SEP_TOKEN.to_string());

        let pad_id = self.vocab.pad_id();
        let mut input_ids: Vec<u32> = tokens.iter().map(|t| self.vocab.lookup(t)).collect();
        input_ids.resize(max_length, pad_id);

        let attention_mask = input_ids
            .iter()
            .map(|&id| u32::from(id != pad_id))
            .collect();

        TokenSequence {
            input_ids,
            attention_mask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn tokenizer() -> SubwordTokenizer {
        let entries = [
            ("[PAD]", 0),
            ("[UNK]", 100),
            ("[CLS]", 101),
            ("[SEP]", 102),
            ("hello", 7592),
            ("world", 2088),
            ("play", 2377),
            ("##ing", 2075),
        ];
        let map: HashMap<String, u32> =
            entries.iter().map(|(t, i)| (t.to_string(), *i)).collect();
        SubwordTokenizer::new(Arc::new(Vocabulary::from_map(map).unwrap()))
    }

    #[test]
    fn test_basic_sequence() {
        let seq = tokenizer().tokenize("Hello World", 6);
        assert_eq!(seq.input_ids, vec![101, 7592, 2088, 102, 0, 0]);
        assert_eq!(seq.attention_mask, vec![1, 1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_subwords_and_unknown() {
        let seq = tokenizer().tokenize("playing zzz", 6);
        assert_eq!(seq.input_ids, vec![101, 2377, 2075, 100, 102, 0]);
        assert_eq!(seq.real_tokens(), 5);
    }

    #[test]
    fn test_empty_input() {
        let seq = tokenizer().tokenize("", 4);
        assert_eq!(seq.input_ids, vec![101, 102, 0, 0]);
        assert_eq!(seq.attention_mask, vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_truncation_drops_tail() {
        let seq = tokenizer().tokenize("hello world hello world", 3);
        assert_eq!(seq.input_ids, vec![101, 7592, 2088]);
        assert_eq!(seq.attention_mask, vec![1, 1, 1]);
    }

    #[test]
    fn test_special_token_text_not_special() {
        // "[SEP]" in the text is lower-cased and segmented, not injected
        let seq = tokenizer().tokenize("[SEP]", 4);
        assert_eq!(seq.input_ids, vec![101, 100, 102, 0]);
    }

    #[test]
    fn test_length_and_mask_invariants() {
        let tok = tokenizer();
        for text in ["", "hello", "playing world hello", "a b c d e f g h i j"] {
            for len in [0, 1, 4, 16] {
                let seq = tok.tokenize(text, len);
                assert_eq!(seq.input_ids.len(), len);
                assert_eq!(seq.attention_mask.len(), len);
                for (id, mask) in seq.input_ids.iter().zip(&seq.attention_mask) {
                    assert!(*mask == 0 || *mask == 1);
                    assert_eq!(*mask == 0, *id == tok.vocab().pad_id());
                }
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let tok = tokenizer().with_max_length(8);
        assert_eq!(tok.encode("Hello playing"), tok.encode("Hello playing"));
    }
}
