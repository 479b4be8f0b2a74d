//! Logical column resolution.
//!
//! The dataset must provide four logical columns: experiment identifier,
//! temperature, pressure and uptake. Headers rarely match the logical names
//! exactly ("P_pa", "T_K", "uptake [mol/g]"), so resolution can run in
//! auto-detect mode: substring match first, then closest-string match above
//! a similarity cutoff, then single-leftover assignment.

use crate::error::{DataError, DataResult};
use crate::table::RawTable;
use serde::{Deserialize, Serialize};

/// The four logical columns every dataset must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalColumn {
    Experiment,
    Temperature,
    Pressure,
    Uptake,
}

impl LogicalColumn {
    pub const ALL: [LogicalColumn; 4] = [
        LogicalColumn::Experiment,
        LogicalColumn::Temperature,
        LogicalColumn::Pressure,
        LogicalColumn::Uptake,
    ];

    /// Default name stem used for auto-detection.
    pub fn stem(&self) -> &'static str {
        match self {
            LogicalColumn::Experiment => "experiment",
            LogicalColumn::Temperature => "temperature",
            LogicalColumn::Pressure => "pressure",
            LogicalColumn::Uptake => "uptake",
        }
    }
}

/// How to locate the logical columns in a raw table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    /// Auto-detect headers instead of requiring exact configured names.
    pub detect_columns: bool,
    pub experiment: String,
    pub temperature: String,
    pub pressure: String,
    pub uptake: String,
    /// Similarity cutoff for the closest-string fallback.
    pub detection_cutoff: f64,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            detect_columns: true,
            experiment: "experiment".to_string(),
            temperature: "temperature".to_string(),
            pressure: "pressure".to_string(),
            uptake: "uptake".to_string(),
            detection_cutoff: 0.6,
        }
    }
}

impl ColumnSpec {
    fn configured_name(&self, col: LogicalColumn) -> &str {
        match col {
            LogicalColumn::Experiment => &self.experiment,
            LogicalColumn::Temperature => &self.temperature,
            LogicalColumn::Pressure => &self.pressure,
            LogicalColumn::Uptake => &self.uptake,
        }
    }
}

/// Resolved header name and position for each logical column.
///
/// Downstream code indexes rows through this struct; no later stage does
/// string lookups against the raw headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedColumns {
    pub experiment: String,
    pub temperature: String,
    pub pressure: String,
    pub uptake: String,
    #[serde(skip)]
    pub experiment_idx: usize,
    #[serde(skip)]
    pub temperature_idx: usize,
    #[serde(skip)]
    pub pressure_idx: usize,
    #[serde(skip)]
    pub uptake_idx: usize,
}

/// Resolve all four logical columns against a table's headers.
pub fn resolve_columns(table: &RawTable, spec: &ColumnSpec) -> DataResult<ResolvedColumns> {
    let mut assigned: [Option<usize>; 4] = [None; 4];
    let mut claimed = vec![false; table.headers.len()];

    for (slot, col) in LogicalColumn::ALL.iter().enumerate() {
        let name = spec.configured_name(*col);
        let found = if spec.detect_columns {
            detect_column(&table.headers, &claimed, name, spec.detection_cutoff)
        } else {
            table
                .headers
                .iter()
                .enumerate()
                .find(|(i, h)| !claimed[*i] && h.as_str() == name)
                .map(|(i, _)| i)
        };
        if let Some(idx) = found {
            assigned[slot] = Some(idx);
            claimed[idx] = true;
        }
    }

    // Single-leftover assignment: when exactly one logical column is still
    // unresolved and exactly one header is unclaimed, they must be the pair.
    let unresolved: Vec<usize> = (0..4).filter(|&i| assigned[i].is_none()).collect();
    let unclaimed: Vec<usize> = (0..claimed.len()).filter(|&i| !claimed[i]).collect();
    if spec.detect_columns && unresolved.len() == 1 && unclaimed.len() == 1 {
        assigned[unresolved[0]] = Some(unclaimed[0]);
    }

    for (slot, col) in LogicalColumn::ALL.iter().enumerate() {
        if assigned[slot].is_none() {
            return Err(DataError::MissingColumn {
                logical_name: col.stem().to_string(),
            });
        }
    }

    let idx = |slot: usize| assigned[slot].unwrap_or_default();
    Ok(ResolvedColumns {
        experiment: table.headers[idx(0)].clone(),
        temperature: table.headers[idx(1)].clone(),
        pressure: table.headers[idx(2)].clone(),
        uptake: table.headers[idx(3)].clone(),
        experiment_idx: idx(0),
        temperature_idx: idx(1),
        pressure_idx: idx(2),
        uptake_idx: idx(3),
    })
}

/// Locate one logical column among the unclaimed headers.
///
/// Substring match wins outright; otherwise the best similarity score at or
/// above the cutoff. Both stages take the first header in column order on
/// ties, so detection is deterministic.
fn detect_column(
    headers: &[String],
    claimed: &[bool],
    stem: &str,
    cutoff: f64,
) -> Option<usize> {
    let stem_lower = stem.to_lowercase();

    for (i, header) in headers.iter().enumerate() {
        if claimed[i] {
            continue;
        }
        if header.to_lowercase().contains(&stem_lower) {
            return Some(i);
        }
    }

    let mut best: Option<(usize, f64)> = None;
    for (i, header) in headers.iter().enumerate() {
        if claimed[i] {
            continue;
        }
        let score = column_similarity(header, &stem_lower);
        if score >= cutoff {
            match best {
                Some((_, s)) if s >= score => {}
                _ => best = Some((i, score)),
            }
        }
    }
    best.map(|(i, _)| i)
}

/// Similarity between a header cell and a logical name stem.
///
/// Abbreviated headers like "P_pa" or "T_K" carry the signal in their first
/// token, so a token that prefixes the stem scores above the cutoff with a
/// bonus proportional to how much of the stem it covers. Everything else
/// falls back to normalized Levenshtein.
fn column_similarity(header: &str, stem_lower: &str) -> f64 {
    let lower = header.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let mut score: f64 = 0.0;
    for token in &tokens {
        if *token == stem_lower {
            return 1.0;
        }
        if stem_lower.starts_with(token) || token.starts_with(stem_lower) {
            let covered = token.len().min(stem_lower.len()) as f64 / stem_lower.len() as f64;
            score = score.max(0.6 + 0.4 * covered);
        }
    }

    score.max(strsim::normalized_levenshtein(&lower, stem_lower))
}
