//! Result data types.

use serde::{Deserialize, Serialize};

pub type RunId = String;

/// Metadata persisted next to a run's artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub dataset: String,
    pub timestamp: String,
    pub solver_version: String,
    pub experiment_count: usize,
    pub models: Vec<String>,
    pub max_iterations: usize,
    pub workers: usize,
    pub fits_total: usize,
    pub fits_failed: usize,
    pub cancelled: bool,
}
