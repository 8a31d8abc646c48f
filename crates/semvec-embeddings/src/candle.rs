//! Candle-based BERT inference.
//!
//! Each session memory-maps the safetensors weights and builds the model from
//! scratch, so sessions are independent and never pooled.

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use tracing::{debug, info};

use crate::cache::ModelPaths;
use crate::error::EmbeddingError;
use crate::inference::{HiddenStates, InferenceSession, ModelInputs, SessionFactory};

#[derive(Deserialize)]
struct ModelDims {
    hidden_size: usize,
}

/// Opens Candle BERT sessions from a config + weights pair.
pub struct CandleSessionFactory {
    config: BertConfig,
    weights: PathBuf,
    hidden_size: usize,
    name: String,
    device: Device,
}

impl CandleSessionFactory {
    /// Read `config.json` and remember where the weights are.
    pub fn from_paths(config_path: &Path, weights_path: &Path) -> Result<Self, EmbeddingError> {
        let config_str = std::fs::read_to_string(config_path)?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| EmbeddingError::ModelNotFound(format!("Invalid config: {}", e)))?;
        let dims: ModelDims = serde_json::from_str(&config_str)
            .map_err(|e| EmbeddingError::ModelNotFound(format!("Invalid config: {}", e)))?;

        if !weights_path.exists() {
            return Err(EmbeddingError::ModelNotFound(
                weights_path.display().to_string(),
            ));
        }

        let name = config_path
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "bert".to_string());

        info!(model = %name, hidden = dims.hidden_size, "Configured Candle model");

        Ok(Self {
            config,
            weights: weights_path.to_path_buf(),
            hidden_size: dims.hidden_size,
            name,
            // CPU only; GPU needs candle feature flags
            device: Device::Cpu,
        })
    }

    pub fn from_model_paths(paths: &ModelPaths) -> Result<Self, EmbeddingError> {
        paths.ensure_exist()?;
        Self::from_paths(&paths.config, &paths.weights)
    }
}

impl SessionFactory for CandleSessionFactory {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn open_session(&self) -> Result<Box<dyn InferenceSession>, EmbeddingError> {
        // SAFETY: the weights file is not modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[self.weights.clone()], DType::F32, &self.device)?
        };
        let model = BertModel::load(vb, &self.config)?;
        debug!(model = %self.name, "Opened inference session");

        Ok(Box::new(CandleSession {
            model,
            device: self.device.clone(),
        }))
    }
}

struct CandleSession {
    model: BertModel,
    device: Device,
}

impl InferenceSession for CandleSession {
    fn run(&self, inputs: &ModelInputs) -> Result<HiddenStates, EmbeddingError> {
        let seq_len = inputs.seq_len();
        let [ids, mask, token_types] = inputs
            .named()
            .map(|(_, values)| Tensor::from_slice(values, (1, seq_len), &self.device));

        let output = self.model.forward(&ids?, &token_types?, Some(&mask?))?;

        let (_, out_len, hidden_size) = output.dims3()?;
        let values = output.flatten_all()?.to_vec1::<f32>()?;
        HiddenStates::new(out_len, hidden_size, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{get_or_download_model, ModelCache};
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_error() {
        let temp = TempDir::new().unwrap();
        let paths = ModelPaths::in_dir(temp.path());
        let result = CandleSessionFactory::from_model_paths(&paths);
        assert!(matches!(result, Err(EmbeddingError::ModelNotFound(_))));
    }

    #[test]
    #[ignore = "requires model download"]
    fn test_session_output_shape() {
        let paths = get_or_download_model(&ModelCache::default()).unwrap();
        let factory = CandleSessionFactory::from_model_paths(&paths).unwrap();
        assert_eq!(factory.hidden_size(), 384);

        let inputs = ModelInputs {
            input_ids: vec![101, 7592, 102, 0],
            attention_mask: vec![1, 1, 1, 0],
            token_type_ids: vec![0; 4],
        };
        let states = factory.open_session().unwrap().run(&inputs).unwrap();
        assert_eq!(states.seq_len(), 4);
        assert_eq!(states.hidden_size(), 384);
    }
}
