//! Error types shared across the semvec workspace.

use thiserror::Error;

/// Errors raised while assembling runtime settings.
#[derive(Debug, Error)]
pub enum SemvecError {
    /// Configuration error (missing file, bad value, failed merge)
    #[error("Configuration error: {0}")]
    Config(String),
}
