//! Error types for the Strata pipeline.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, document store, format parsing,
//! and pipeline orchestration.

use thiserror::Error;

/// Unified error type for the Strata application.
///
/// All fallible functions outside the schema engine return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document store errors (unavailable, write refused, corrupt rows)
    #[error("Store error: {0}")]
    Store(String),

    /// Format reader errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Run loop errors (task failures, timeouts)
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
