//! Comma-joined serialization for list-valued columns.
//!
//! Pressure and uptake series are persisted as comma-joined decimal
//! strings. `f64` Display output is the shortest string that parses back
//! to the same bits, so decoding round-trips exactly.

use crate::error::{ResultsError, ResultsResult};

pub fn join_series(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn parse_series(text: &str) -> ResultsResult<Vec<f64>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| ResultsError::SeriesParse {
                    what: format!("{part:?}: {e}"),
                })
        })
        .collect()
}
