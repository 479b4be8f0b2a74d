//! Error types for result assembly and storage.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResultsError {
    #[error("Result tree does not match the experiment table: {what}")]
    ShapeMismatch { what: String },

    #[error("Could not parse series value: {what}")]
    SeriesParse { what: String },

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ResultsResult<T> = Result<T, ResultsError>;
