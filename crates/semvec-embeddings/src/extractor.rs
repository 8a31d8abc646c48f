//! Text -> embedding driver.
//!
//! Tokenizes, runs one fresh inference session, then pools. Nothing is
//! cached: repeated text is re-tokenized and re-run.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::ModelPaths;
use crate::candle::CandleSessionFactory;
use crate::error::EmbeddingError;
use crate::inference::{ModelInputs, SessionFactory};
use crate::model::{Embedding, EmbeddingModel, ModelInfo};
use crate::pooling::PoolingMethod;
use crate::tokenizer::{SubwordTokenizer, TokenSequence};
use crate::vocab::Vocabulary;

/// Embeds text with a tokenizer, a session factory and a pooling strategy.
pub struct EmbeddingExtractor<F: SessionFactory> {
    tokenizer: SubwordTokenizer,
    sessions: F,
    pooling: PoolingMethod,
    normalize: bool,
    info: ModelInfo,
}

impl<F: SessionFactory> EmbeddingExtractor<F> {
    pub fn new(tokenizer: SubwordTokenizer, sessions: F) -> Self {
        let info = ModelInfo {
            name: sessions.model_name().to_string(),
            dimension: sessions.hidden_size(),
            max_sequence_length: tokenizer.max_length(),
        };
        Self {
            tokenizer,
            sessions,
            pooling: PoolingMethod::default(),
            normalize: false,
            info,
        }
    }

    pub fn with_pooling(mut self, pooling: PoolingMethod) -> Self {
        self.pooling = pooling;
        self
    }

    /// L2-normalize every pooled vector.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn pooling(&self) -> PoolingMethod {
        self.pooling
    }

    pub fn tokenizer(&self) -> &SubwordTokenizer {
        &self.tokenizer
    }

    /// The backend that opens inference sessions.
    pub fn sessions(&self) -> &F {
        &self.sessions
    }

    /// Run the model over an already tokenized sequence and pool its output.
    pub fn embed_sequence(
        &self,
        sequence: &TokenSequence,
        method: PoolingMethod,
    ) -> Result<Embedding, EmbeddingError> {
        let inputs = ModelInputs::from_sequence(sequence);
        let session = self.sessions.open_session()?;
        let states = session.run(&inputs)?;

        if states.seq_len() != sequence.len() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: sequence.len(),
                actual: states.seq_len(),
            });
        }

        let pooled = Embedding::new(method.pool(&states, &sequence.attention_mask));
        debug!(
            pooling = %method,
            tokens = sequence.real_tokens(),
            dim = pooled.dimension(),
            "Embedded sequence"
        );

        Ok(if self.normalize {
            pooled.normalized()
        } else {
            pooled
        })
    }

    /// Embed with an explicit pooling method.
    pub fn embed_with(&self, text: &str, method: PoolingMethod) -> Result<Embedding, EmbeddingError> {
        let sequence = self.tokenizer.encode(text);
        self.embed_sequence(&sequence, method)
    }

    /// Embed with a pooling method named at runtime.
    ///
    /// An unrecognized selector yields the zero-length sentinel embedding
    /// without running the model.
    pub fn embed_with_selector(&self, text: &str, selector: &str) -> Result<Embedding, EmbeddingError> {
        match selector.parse::<PoolingMethod>() {
            Ok(method) => self.embed_with(text, method),
            Err(_) => {
                warn!(selector, "Unsupported pooling selector, returning empty embedding");
                Ok(Embedding::empty())
            }
        }
    }
}

impl EmbeddingExtractor<CandleSessionFactory> {
    /// Build a Candle-backed extractor from a vocabulary file and model files.
    pub fn load(
        vocabulary_path: &std::path::Path,
        model: &ModelPaths,
        max_length: usize,
    ) -> Result<Self, EmbeddingError> {
        let vocab = Arc::new(Vocabulary::from_file(vocabulary_path)?);
        let tokenizer = SubwordTokenizer::new(vocab).with_max_length(max_length);
        let sessions = CandleSessionFactory::from_model_paths(model)?;
        Ok(Self::new(tokenizer, sessions))
    }
}

impl<F: SessionFactory> EmbeddingModel for EmbeddingExtractor<F> {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.embed_with(text, self.pooling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{HiddenStates, InferenceSession};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hidden vector at each position is `[id, position]`.
    struct EchoSession;

    impl InferenceSession for EchoSession {
        fn run(&self, inputs: &ModelInputs) -> Result<HiddenStates, EmbeddingError> {
            let values = inputs
                .input_ids
                .iter()
                .enumerate()
                .flat_map(|(pos, &id)| [id as f32, pos as f32])
                .collect();
            HiddenStates::new(inputs.seq_len(), 2, values)
        }
    }

    #[derive(Default)]
    struct EchoFactory {
        opened: AtomicUsize,
    }

    impl SessionFactory for EchoFactory {
        fn model_name(&self) -> &str {
            "echo"
        }

        fn hidden_size(&self) -> usize {
            2
        }

        fn open_session(&self) -> Result<Box<dyn InferenceSession>, EmbeddingError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(EchoSession))
        }
    }

    fn extractor() -> EmbeddingExtractor<EchoFactory> {
        let map: HashMap<String, u32> = [("[PAD]", 0), ("[UNK]", 1), ("[CLS]", 2), ("[SEP]", 3), ("hi", 10)]
            .iter()
            .map(|(t, i)| (t.to_string(), *i))
            .collect();
        let tokenizer =
            SubwordTokenizer::new(Arc::new(Vocabulary::from_map(map).unwrap())).with_max_length(5);
        EmbeddingExtractor::new(tokenizer, EchoFactory::default())
    }

    #[test]
    fn test_cls_pooling() {
        // [CLS] hi [SEP] [PAD] [PAD]
        let emb = extractor().embed_with("hi", PoolingMethod::ClsToken).unwrap();
        assert_eq!(emb.values, vec![2.0, 0.0]);
    }

    #[test]
    fn test_mean_pooling_skips_padding() {
        let emb = extractor().embed_with("hi", PoolingMethod::MeanPooling).unwrap();
        // ids 2, 10, 3 at positions 0, 1, 2
        assert_eq!(emb.values, vec![5.0, 1.0]);
    }

    #[test]
    fn test_unknown_selector_is_empty_sentinel() {
        let ex = extractor();
        let emb = ex.embed_with_selector("hi", "max_pooling").unwrap();
        assert!(emb.is_empty());
        assert_eq!(ex.sessions.opened.load(Ordering::SeqCst), 0);

        let emb = ex.embed_with_selector("hi", "mean").unwrap();
        assert_eq!(emb.dimension(), 2);
    }

    #[test]
    fn test_session_per_call() {
        let ex = extractor();
        ex.embed("hi").unwrap();
        ex.embed("hi").unwrap();
        assert_eq!(ex.sessions.opened.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_normalize() {
        let emb = extractor()
            .with_normalize(true)
            .embed_with("hi", PoolingMethod::MeanPooling)
            .unwrap();
        assert!((emb.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_model_info() {
        let ex = extractor();
        assert_eq!(ex.info().dimension, 2);
        assert_eq!(ex.info().max_sequence_length, 5);
        assert_eq!(ex.info().name, "echo");
    }
}
