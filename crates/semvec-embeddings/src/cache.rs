//! Model file resolution.
//!
//! Locates `config.json`, `tokenizer.json` and `model.safetensors` in a local
//! cache directory, fetching them from the Hugging Face Hub when missing.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use semvec_types::DEFAULT_MODEL_REPO;

use crate::error::EmbeddingError;

pub const CONFIG_FILE: &str = "config.json";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const WEIGHTS_FILE: &str = "model.safetensors";

/// Files fetched for every model
pub const MODEL_FILES: &[&str] = &[CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE];

/// Local model cache rooted at `cache_dir`.
#[derive(Debug, Clone)]
pub struct ModelCache {
    pub cache_dir: PathBuf,
    pub repo_id: String,
}

impl Default for ModelCache {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("semvec")
            .join("models");

        Self {
            cache_dir,
            repo_id: DEFAULT_MODEL_REPO.to_string(),
        }
    }
}

impl ModelCache {
    pub fn new(cache_dir: impl Into<PathBuf>, repo_id: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            repo_id: repo_id.into(),
        }
    }

    /// Directory for this repository (`org/name` -> `org_name`)
    pub fn model_dir(&self) -> PathBuf {
        self.cache_dir.join(self.repo_id.replace('/', "_"))
    }

    pub fn is_cached(&self) -> bool {
        let model_dir = self.model_dir();
        MODEL_FILES.iter().all(|f| model_dir.join(f).exists())
    }
}

/// Resolved locations of the model files.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelPaths {
    /// Paths inside an explicit model directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            config: dir.join(CONFIG_FILE),
            tokenizer: dir.join(TOKENIZER_FILE),
            weights: dir.join(WEIGHTS_FILE),
        }
    }

    /// Fail with `ModelNotFound` naming the first missing file.
    pub fn ensure_exist(&self) -> Result<(), EmbeddingError> {
        for path in [&self.config, &self.weights] {
            if !path.exists() {
                return Err(EmbeddingError::ModelNotFound(path.display().to_string()));
            }
        }
        Ok(())
    }
}

/// Get or download model files.
pub fn get_or_download_model(cache: &ModelCache) -> Result<ModelPaths, EmbeddingError> {
    let model_dir = cache.model_dir();

    if cache.is_cached() {
        debug!(path = ?model_dir, "Using cached model");
    } else {
        info!(repo = %cache.repo_id, "Downloading model files...");
        download_model_files(cache)?;
    }

    Ok(ModelPaths::in_dir(model_dir))
}

fn download_model_files(cache: &ModelCache) -> Result<(), EmbeddingError> {
    use hf_hub::api::sync::Api;

    let api = Api::new().map_err(|e| EmbeddingError::Download(e.to_string()))?;
    let repo = api.model(cache.repo_id.clone());

    let model_dir = cache.model_dir();
    std::fs::create_dir_all(&model_dir)?;

    for filename in MODEL_FILES {
        info!(file = filename, "Downloading...");
        let source_path = repo
            .get(filename)
            .map_err(|e| EmbeddingError::Download(format!("{}: {}", filename, e)))?;

        let dest_path = model_dir.join(filename);
        std::fs::copy(&source_path, &dest_path)?;
        debug!(file = filename, dest = ?dest_path, "Copied into cache");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cache_default() {
        let cache = ModelCache::default();
        assert!(cache.cache_dir.to_string_lossy().contains("semvec"));
        assert_eq!(cache.repo_id, DEFAULT_MODEL_REPO);
        assert_eq!(cache.repo_id, semvec_types::Settings::default().model_repo);
    }

    #[test]
    fn test_model_dir_flattens_repo() {
        let cache = ModelCache::new("/tmp/cache", "org/model");
        assert_eq!(cache.model_dir(), PathBuf::from("/tmp/cache/org_model"));
    }

    #[test]
    fn test_is_cached() {
        let temp = TempDir::new().unwrap();
        let cache = ModelCache::new(temp.path(), "test/model");
        assert!(!cache.is_cached());

        std::fs::create_dir_all(cache.model_dir()).unwrap();
        for f in MODEL_FILES {
            std::fs::write(cache.model_dir().join(f), b"{}").unwrap();
        }
        assert!(cache.is_cached());
    }

    #[test]
    fn test_ensure_exist_reports_missing() {
        let temp = TempDir::new().unwrap();
        let paths = ModelPaths::in_dir(temp.path());
        let err = paths.ensure_exist().unwrap_err();
        assert!(matches!(err, EmbeddingError::ModelNotFound(p) if p.ends_with("config.json")));
    }
}
