//! Error types for bulk fitting configuration and execution.

use af_models::ModelError;
use thiserror::Error;

/// Errors that fail a bulk run before any fitting begins.
#[derive(Error, Debug)]
pub enum FitError {
    #[error("Invalid bounds for {model}.{param}: {what}")]
    InvalidBounds {
        model: String,
        param: String,
        what: String,
    },

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("Could not parse fit settings: {0}")]
    Settings(#[from] serde_yaml::Error),

    #[error("Worker pool setup failed: {what}")]
    WorkerPool { what: String },
}

pub type FitResult<T> = Result<T, FitError>;
