//! Configuration loading for semvec.
//!
//! Layered precedence: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `~/.config/semvec/config.toml`.

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SemvecError;

/// Model repository used when no explicit model location is configured.
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Fixed token sequence length fed to the model.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 128;

/// Index variant built when none is configured.
pub const DEFAULT_INDEX_TYPE: &str = "Flat";

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Vocabulary source (tokenizer.json or vocab.txt).
    /// Resolved from the model cache when unset.
    #[serde(default)]
    pub vocabulary_path: Option<String>,

    /// Directory holding config.json and model.safetensors.
    /// Resolved from the model cache when unset.
    #[serde(default)]
    pub model_path: Option<String>,

    /// Hugging Face repository to download when paths are unset
    #[serde(default = "default_model_repo")]
    pub model_repo: String,

    /// Directory for downloaded model files
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Token sequence length (truncate or pad to this)
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,

    /// Pooling strategy name (cls_token, mean_pooling)
    #[serde(default = "default_pooling")]
    pub pooling: String,

    /// L2-normalize embeddings after pooling
    #[serde(default)]
    pub normalize: bool,

    /// Index variant name (Flat, FlatIP, IVFFlat, HNSWFlat, ...)
    #[serde(default = "default_index_type")]
    pub index_type: String,

    /// Neighbors returned per query when the caller does not say
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_model_repo() -> String {
    DEFAULT_MODEL_REPO.to_string()
}

fn default_cache_dir() -> String {
    ProjectDirs::from("", "", "semvec")
        .map(|p| p.cache_dir().join("models"))
        .unwrap_or_else(|| PathBuf::from(".cache/semvec/models"))
        .to_string_lossy()
        .to_string()
}

fn default_max_sequence_length() -> usize {
    DEFAULT_MAX_SEQUENCE_LENGTH
}

fn default_pooling() -> String {
    "cls_token".to_string()
}

fn default_index_type() -> String {
    DEFAULT_INDEX_TYPE.to_string()
}

fn default_k() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vocabulary_path: None,
            model_path: None,
            model_repo: default_model_repo(),
            cache_dir: default_cache_dir(),
            max_sequence_length: default_max_sequence_length(),
            pooling: default_pooling(),
            normalize: false,
            index_type: default_index_type(),
            default_k: default_k(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/semvec/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (SEMVEC_*, nested keys joined with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, SemvecError> {
        let config_dir = ProjectDirs::from("", "", "semvec")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("model_repo", default_model_repo())
            .map_err(|e| SemvecError::Config(e.to_string()))?
            .set_default("cache_dir", default_cache_dir())
            .map_err(|e| SemvecError::Config(e.to_string()))?
            .set_default("max_sequence_length", default_max_sequence_length() as i64)
            .map_err(|e| SemvecError::Config(e.to_string()))?
            .set_default("pooling", default_pooling())
            .map_err(|e| SemvecError::Config(e.to_string()))?
            .set_default("normalize", false)
            .map_err(|e| SemvecError::Config(e.to_string()))?
            .set_default("index_type", default_index_type())
            .map_err(|e| SemvecError::Config(e.to_string()))?
            .set_default("default_k", default_k() as i64)
            .map_err(|e| SemvecError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| SemvecError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SEMVEC_MAX_SEQUENCE_LENGTH, SEMVEC_INDEX_TYPE, SEMVEC_VOCABULARY_PATH, ...
        builder = builder.add_source(
            Environment::with_prefix("SEMVEC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| SemvecError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| SemvecError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), SemvecError> {
        if self.max_sequence_length == 0 {
            return Err(SemvecError::Config(
                "max_sequence_length must be > 0".to_string(),
            ));
        }
        if self.default_k == 0 {
            return Err(SemvecError::Config("default_k must be > 0".to_string()));
        }
        Ok(())
    }

    /// Vocabulary path with `~/` expanded, if configured.
    pub fn expanded_vocabulary_path(&self) -> Option<PathBuf> {
        self.vocabulary_path.as_deref().map(expand_home)
    }

    /// Model directory with `~/` expanded, if configured.
    pub fn expanded_model_path(&self) -> Option<PathBuf> {
        self.model_path.as_deref().map(expand_home)
    }

    /// Cache directory with `~/` expanded.
    pub fn expanded_cache_dir(&self) -> PathBuf {
        expand_home(&self.cache_dir)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
