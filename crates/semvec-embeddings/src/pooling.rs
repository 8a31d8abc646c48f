//! Reduce per-token hidden states to one sentence vector.

use std::fmt;
use std::str::FromStr;

use crate::error::EmbeddingError;
use crate::inference::HiddenStates;

/// Pooling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolingMethod {
    /// Hidden vector of the injected `[CLS]` position
    #[default]
    ClsToken,
    /// Mean of hidden vectors whose attention mask is 1
    MeanPooling,
}

impl PoolingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolingMethod::ClsToken => "cls_token",
            PoolingMethod::MeanPooling => "mean_pooling",
        }
    }

    pub fn pool(&self, states: &HiddenStates, attention_mask: &[u32]) -> Vec<f32> {
        match self {
            PoolingMethod::ClsToken => cls_pooling(states),
            PoolingMethod::MeanPooling => mean_pooling(states, attention_mask),
        }
    }
}

impl fmt::Display for PoolingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoolingMethod {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "cls" | "cls_token" => Ok(PoolingMethod::ClsToken),
            "mean" | "mean_pooling" => Ok(PoolingMethod::MeanPooling),
            other => Err(EmbeddingError::InvalidInput(format!(
                "unsupported pooling method: {other}"
            ))),
        }
    }
}

/// Hidden vector at position 0. Zero vector for an empty sequence.
pub fn cls_pooling(states: &HiddenStates) -> Vec<f32> {
    if states.seq_len() == 0 {
        return vec![0.0; states.hidden_size()];
    }
    states.row(0).to_vec()
}

/// Element-wise mean over positions with mask 1.
///
/// Returns a zero vector when no position is unmasked.
pub fn mean_pooling(states: &HiddenStates, attention_mask: &[u32]) -> Vec<f32> {
    let mut sum = vec![0.0f32; states.hidden_size()];
    let mut count = 0usize;

    for (pos, &mask) in attention_mask.iter().enumerate().take(states.seq_len()) {
        if mask != 1 {
            continue;
        }
        count += 1;
        for (acc, v) in sum.iter_mut().zip(states.row(pos)) {
            *acc += v;
        }
    }

    if count > 0 {
        let n = count as f32;
        sum.iter_mut().for_each(|v| *v /= n);
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states() -> HiddenStates {
        // 3 positions, hidden size 2
        HiddenStates::new(3, 2, vec![1.0, 2.0, 3.0, 4.0, 100.0, 100.0]).unwrap()
    }

    #[test]
    fn test_cls_pooling_takes_first_row() {
        assert_eq!(cls_pooling(&states()), vec![1.0, 2.0]);
    }

    #[test]
    fn test_mean_pooling_excludes_padding() {
        let pooled = mean_pooling(&states(), &[1, 1, 0]);
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn test_mean_pooling_all_masked_is_zero() {
        let pooled = mean_pooling(&states(), &[0, 0, 0]);
        assert_eq!(pooled, vec![0.0, 0.0]);
    }

    #[test]
    fn test_pool_dispatch() {
        let s = states();
        assert_eq!(PoolingMethod::ClsToken.pool(&s, &[1, 1, 1]), vec![1.0, 2.0]);
        assert_eq!(
            PoolingMethod::MeanPooling.pool(&s, &[1, 1, 1]),
            vec![104.0 / 3.0, 106.0 / 3.0]
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("cls".parse::<PoolingMethod>().unwrap(), PoolingMethod::ClsToken);
        assert_eq!(
            "Mean-Pooling".parse::<PoolingMethod>().unwrap(),
            PoolingMethod::MeanPooling
        );
        assert!("max".parse::<PoolingMethod>().is_err());
        assert_eq!(PoolingMethod::MeanPooling.to_string(), "mean_pooling");
    }
}
