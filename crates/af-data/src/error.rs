//! Error types for dataset operations.

use thiserror::Error;

/// Errors that can occur while loading or preprocessing a dataset.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Could not resolve required column: {logical_name}")]
    MissingColumn { logical_name: String },

    #[error("No experiments left after filtering")]
    EmptyDataset,

    #[error("Dataset has no header row")]
    MissingHeader,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DataResult<T> = Result<T, DataError>;
