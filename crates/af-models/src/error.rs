//! Error types for model evaluation.

use thiserror::Error;

/// Errors that can occur when looking up or evaluating an isotherm model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown model: {name}")]
    UnknownModel { name: String },

    #[error("{model} expects {expected} parameters, got {got}")]
    ParameterCount {
        model: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Domain error in {model}: {what}")]
    Domain {
        model: &'static str,
        what: &'static str,
    },
}

pub type ModelResult<T> = Result<T, ModelError>;
