//! Inference boundary.
//!
//! The model consumes three named `[1, seq_len]` integer tensors and yields a
//! `[1, seq_len, hidden_size]` float tensor. A `SessionFactory` opens a fresh
//! `InferenceSession` for every embedding call; sessions are never shared.

use crate::error::EmbeddingError;
use crate::tokenizer::TokenSequence;

/// Tensor name for token ids
pub const INPUT_IDS: &str = "input_ids";
/// Tensor name for the attention mask
pub const ATTENTION_MASK: &str = "attention_mask";
/// Tensor name for segment ids (all zero for single sentences)
pub const TOKEN_TYPE_IDS: &str = "token_type_ids";

/// The three model inputs for a single sequence (batch size 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInputs {
    pub input_ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub token_type_ids: Vec<u32>,
}

impl ModelInputs {
    pub fn from_sequence(sequence: &TokenSequence) -> Self {
        Self {
            input_ids: sequence.input_ids.clone(),
            attention_mask: sequence.attention_mask.clone(),
            token_type_ids: vec![0; sequence.input_ids.len()],
        }
    }

    pub fn seq_len(&self) -> usize {
        self.input_ids.len()
    }

    /// Inputs paired with their tensor names.
    pub fn named(&self) -> [(&'static str, &[u32]); 3] {
        [
            (INPUT_IDS, self.input_ids.as_slice()),
            (ATTENTION_MASK, self.attention_mask.as_slice()),
            (TOKEN_TYPE_IDS, self.token_type_ids.as_slice()),
        ]
    }
}

/// Last hidden layer for one sequence, row-major `[seq_len, hidden_size]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenStates {
    seq_len: usize,
    hidden_size: usize,
    values: Vec<f32>,
}

impl HiddenStates {
    pub fn new(seq_len: usize, hidden_size: usize, values: Vec<f32>) -> Result<Self, EmbeddingError> {
        if values.len() != seq_len * hidden_size {
            return Err(EmbeddingError::InvalidOutput(format!(
                "expected {} x {} = {} values, got {}",
                seq_len,
                hidden_size,
                seq_len * hidden_size,
                values.len()
            )));
        }
        Ok(Self {
            seq_len,
            hidden_size,
            values,
        })
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Hidden vector at sequence position `pos`.
    pub fn row(&self, pos: usize) -> &[f32] {
        let start = pos * self.hidden_size;
        &self.values[start..start + self.hidden_size]
    }
}

/// One model invocation context.
pub trait InferenceSession {
    fn run(&self, inputs: &ModelInputs) -> Result<HiddenStates, EmbeddingError>;
}

/// Opens inference sessions against one model.
pub trait SessionFactory: Send + Sync {
    /// Model name for reporting
    fn model_name(&self) -> &str;

    /// Width of the hidden layer (the embedding dimension)
    fn hidden_size(&self) -> usize;

    fn open_session(&self) -> Result<Box<dyn InferenceSession>, EmbeddingError>;
}
