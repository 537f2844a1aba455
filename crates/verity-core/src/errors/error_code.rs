//! VerityErrorCode trait for structured error reporting.

/// Every error enum implements this to expose a stable machine-readable code
/// alongside its human-readable message.
pub trait VerityErrorCode {
    /// Returns the error code string (e.g., "CONFIG_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted report string: `[ERROR_CODE] message`.
    fn report_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const INVALID_PARAMETER: &str = "INVALID_PARAMETER";
pub const UNKNOWN_ALGORITHM: &str = "UNKNOWN_ALGORITHM";
pub const UNKNOWN_PARTICIPANT: &str = "UNKNOWN_PARTICIPANT";
pub const UNKNOWN_QUESTION: &str = "UNKNOWN_QUESTION";
pub const UNKNOWN_CHOICE: &str = "UNKNOWN_CHOICE";
