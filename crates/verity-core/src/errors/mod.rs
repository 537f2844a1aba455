//! Error handling for Verity.
//! One error enum per concern, `thiserror` only.

pub mod config_error;
pub mod error_code;
pub mod inference_error;
pub mod lookup_error;
pub mod verity_error;

pub use config_error::ConfigError;
pub use error_code::VerityErrorCode;
pub use inference_error::InferenceError;
pub use lookup_error::LookupError;
pub use verity_error::{VerityError, VerityResult};
