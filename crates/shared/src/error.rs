//! Application-wide error types.

use thiserror::Error;

use crate::types::FixedParseError;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Failures outside the allocation engine.
///
/// Allocation failures have their own taxonomy in the engine crate; this
/// type covers request decoding and startup.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body or parameter could not be decoded.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Configuration(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

impl From<FixedParseError> for AppError {
    fn from(err: FixedParseError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
