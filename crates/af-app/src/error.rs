//! Error types for the af-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates and
/// provides a unified error interface for frontends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read dataset file: {path}")]
    DatasetFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Dataset error: {0}")]
    Data(String),

    #[error("Fit configuration error: {0}")]
    Config(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for af-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Conversions from backend error types
impl From<af_data::DataError> for AppError {
    fn from(err: af_data::DataError) -> Self {
        AppError::Data(err.to_string())
    }
}

impl From<af_fit::FitError> for AppError {
    fn from(err: af_fit::FitError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<af_results::ResultsError> for AppError {
    fn from(err: af_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
