//! Estimator construction errors.
//!
//! A run itself never fails; only building an estimator from out-of-range
//! parameters or naming an algorithm that does not exist does.

use super::error_code::{self, VerityErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Unknown algorithm: {name}")]
    UnknownAlgorithm { name: String },
}

impl InferenceError {
    pub fn invalid(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

impl VerityErrorCode for InferenceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => error_code::INVALID_PARAMETER,
            Self::UnknownAlgorithm { .. } => error_code::UNKNOWN_ALGORITHM,
        }
    }
}
