//! Content-based hashing for run IDs.

use af_fit::FitSettings;
use sha2::{Digest, Sha256};

/// Derive a stable run id from the dataset bytes, the canonicalized fit
/// settings and the solver version. Identical inputs always map to the
/// same id, so re-running an unchanged dataset overwrites its own run.
pub fn compute_run_id(dataset: &[u8], settings: &FitSettings, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    hasher.update(dataset);

    let settings_json = serde_json::to_string(settings).unwrap_or_default();
    hasher.update(settings_json.as_bytes());

    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
