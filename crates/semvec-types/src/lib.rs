//! # semvec-types
//!
//! Shared configuration and error types for the semvec workspace.
//!
//! - `Settings`: layered configuration (defaults, config file, env vars, CLI flags)
//! - `SemvecError`: errors raised while loading or validating settings

pub mod config;
pub mod error;

pub use config::{Settings, DEFAULT_INDEX_TYPE, DEFAULT_MAX_SEQUENCE_LENGTH, DEFAULT_MODEL_REPO};
pub use error::SemvecError;
