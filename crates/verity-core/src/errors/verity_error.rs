//! Top-level error wrapping every subsystem error.

use super::error_code::VerityErrorCode;
use super::{ConfigError, InferenceError, LookupError};

#[derive(Debug, thiserror::Error)]
pub enum VerityError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),
}

impl VerityErrorCode for VerityError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Inference(e) => e.error_code(),
            Self::Lookup(e) => e.error_code(),
        }
    }
}

/// Convenience alias for results that can fail with any Verity error.
pub type VerityResult<T> = Result<T, VerityError>;
