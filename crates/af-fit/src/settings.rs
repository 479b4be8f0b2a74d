//! Fit settings document.
//!
//! A run is configured by one YAML document: which models to fit, their
//! per-parameter initial guesses and bounds, the shared evaluation budget,
//! the worker count and the column layout of the input dataset.

use crate::error::FitResult;
use af_data::ColumnSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_max_iterations() -> usize {
    1000
}

fn default_save_best() -> bool {
    true
}

/// Per-model parameter configuration. Parameters missing from a map fall
/// back to `initial = 1.0`, `min = 0.0`, `max = 100.0`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelSettings {
    pub model: String,
    #[serde(default)]
    pub initial: BTreeMap<String, f64>,
    #[serde(default)]
    pub min: BTreeMap<String, f64>,
    #[serde(default)]
    pub max: BTreeMap<String, f64>,
}

impl ModelSettings {
    pub fn named(model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..Self::default()
        }
    }
}

/// Full fitting configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSettings {
    /// Residual evaluation budget per (experiment, model) fit
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Worker pool size; 0 means one worker per core, 1 means sequential
    #[serde(default)]
    pub workers: usize,
    /// Persist per-model best-fit subsets
    #[serde(default = "default_save_best")]
    pub save_best: bool,
    /// Models to fit, in the order results are reported
    pub models: Vec<ModelSettings>,
    /// Input column layout
    #[serde(default)]
    pub columns: ColumnSpec,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            workers: 0,
            save_best: default_save_best(),
            models: vec![
                ModelSettings::named("Langmuir"),
                ModelSettings::named("Sips"),
                ModelSettings::named("Freundlich"),
                ModelSettings::named("Temkin"),
            ],
            columns: ColumnSpec::default(),
        }
    }
}

impl FitSettings {
    pub fn from_yaml_str(content: &str) -> FitResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml_string(&self) -> FitResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
