//! Row filtering, grouping and per-experiment statistics.

use crate::columns::{resolve_columns, ColumnSpec, ResolvedColumns};
use crate::error::{DataError, DataResult};
use crate::table::RawTable;
use af_core::{finite_max, finite_min};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// One experiment: parallel ordered pressure/uptake series at one temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    pub name: String,
    pub temperature: f64,
    pub pressure: Vec<f64>,
    pub uptake: Vec<f64>,
    pub min_pressure: f64,
    pub max_pressure: f64,
    pub min_uptake: f64,
    pub max_uptake: f64,
}

impl Experiment {
    pub fn measurement_count(&self) -> usize {
        self.pressure.len()
    }
}

/// Experiments in first-seen order, ready for fitting.
#[derive(Debug, Clone, Default)]
pub struct GroupedTable {
    pub experiments: Vec<Experiment>,
}

impl GroupedTable {
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }
}

/// Counts reported after preprocessing, for logs and run manifests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessSummary {
    pub resolved: ResolvedColumns,
    pub total_rows: usize,
    pub rows_dropped_missing: usize,
    pub rows_dropped_invalid: usize,
    pub experiments_dropped_short: usize,
    pub experiment_count: usize,
    pub measurement_count: usize,
    pub mean_measurements: f64,
}

impl fmt::Display for PreprocessSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset statistics")?;
        writeln!(f, "  Experiment column:   {}", self.resolved.experiment)?;
        writeln!(f, "  Temperature column:  {}", self.resolved.temperature)?;
        writeln!(f, "  Pressure column:     {}", self.resolved.pressure)?;
        writeln!(f, "  Uptake column:       {}", self.resolved.uptake)?;
        writeln!(f, "  Rows in file:        {}", self.total_rows)?;
        writeln!(f, "  Dropped (missing):   {}", self.rows_dropped_missing)?;
        writeln!(f, "  Dropped (invalid):   {}", self.rows_dropped_invalid)?;
        writeln!(f, "  Short experiments:   {}", self.experiments_dropped_short)?;
        writeln!(f, "  Experiments:         {}", self.experiment_count)?;
        writeln!(f, "  Measurements:        {}", self.measurement_count)?;
        write!(f, "  Mean per experiment: {:.1}", self.mean_measurements)
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Preprocess a raw table into grouped per-experiment arrays.
///
/// Steps, in order: resolve the four logical columns, drop rows with missing
/// or out-of-range cells (temperature must be positive, pressure and uptake
/// nonnegative), group by experiment identifier preserving first-seen order,
/// derive per-group min/max statistics, and drop groups with fewer than two
/// retained measurements.
pub fn preprocess(
    table: &RawTable,
    spec: &ColumnSpec,
) -> DataResult<(GroupedTable, PreprocessSummary)> {
    let resolved = resolve_columns(table, spec)?;
    debug!(
        experiment = %resolved.experiment,
        temperature = %resolved.temperature,
        pressure = %resolved.pressure,
        uptake = %resolved.uptake,
        "resolved dataset columns"
    );

    let mut rows_dropped_missing = 0usize;
    let mut rows_dropped_invalid = 0usize;

    struct Group {
        name: String,
        temperature: f64,
        pressure: Vec<f64>,
        uptake: Vec<f64>,
    }

    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in &table.rows {
        let name = row[resolved.experiment_idx].trim();
        let temperature = parse_cell(&row[resolved.temperature_idx]);
        let pressure = parse_cell(&row[resolved.pressure_idx]);
        let uptake = parse_cell(&row[resolved.uptake_idx]);

        let (temperature, pressure, uptake) = match (temperature, pressure, uptake) {
            (Some(t), Some(p), Some(u)) if !name.is_empty() => (t, p, u),
            _ => {
                rows_dropped_missing += 1;
                continue;
            }
        };

        if temperature <= 0.0 || pressure < 0.0 || uptake < 0.0 {
            rows_dropped_invalid += 1;
            continue;
        }

        let slot = match index.get(name) {
            Some(&i) => i,
            None => {
                groups.push(Group {
                    name: name.to_string(),
                    temperature,
                    pressure: Vec::new(),
                    uptake: Vec::new(),
                });
                index.insert(name.to_string(), groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[slot].pressure.push(pressure);
        groups[slot].uptake.push(uptake);
    }

    let mut experiments_dropped_short = 0usize;
    let mut experiments = Vec::with_capacity(groups.len());
    for group in groups {
        if group.pressure.len() < 2 {
            experiments_dropped_short += 1;
            continue;
        }
        // Groups hold at least two finite values here, so the stats exist
        let min_pressure = finite_min(&group.pressure).unwrap_or(f64::NAN);
        let max_pressure = finite_max(&group.pressure).unwrap_or(f64::NAN);
        let min_uptake = finite_min(&group.uptake).unwrap_or(f64::NAN);
        let max_uptake = finite_max(&group.uptake).unwrap_or(f64::NAN);
        experiments.push(Experiment {
            name: group.name,
            temperature: group.temperature,
            pressure: group.pressure,
            uptake: group.uptake,
            min_pressure,
            max_pressure,
            min_uptake,
            max_uptake,
        });
    }

    if experiments.is_empty() {
        return Err(DataError::EmptyDataset);
    }

    let measurement_count: usize = experiments.iter().map(|e| e.measurement_count()).sum();
    let summary = PreprocessSummary {
        resolved,
        total_rows: table.row_count(),
        rows_dropped_missing,
        rows_dropped_invalid,
        experiments_dropped_short,
        experiment_count: experiments.len(),
        measurement_count,
        mean_measurements: measurement_count as f64 / experiments.len() as f64,
    };

    Ok((GroupedTable { experiments }, summary))
}
