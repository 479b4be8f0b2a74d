//! Run storage API.

use crate::error::{ResultsError, ResultsResult};
use crate::types::RunManifest;
use std::fs;
use std::path::{Path, PathBuf};

/// CSV artifacts produced by one run, already rendered.
#[derive(Debug, Clone, Default)]
pub struct RunArtifacts {
    pub processed_csv: String,
    pub results_csv: String,
    /// Per-model best-fit subsets, `(model name, csv)`
    pub best_fit: Vec<(String, String)>,
}

#[derive(Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store rooted under `<out_dir>/.adsorbfit/runs`.
    pub fn for_output_dir(out_dir: &Path) -> ResultsResult<Self> {
        Self::new(out_dir.join(".adsorbfit").join("runs"))
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join("manifest.json").exists()
    }

    pub fn save_run(&self, manifest: &RunManifest, artifacts: &RunArtifacts) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let manifest_path = run_dir.join("manifest.json");
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(manifest_path, manifest_json)?;

        fs::write(run_dir.join("processed.csv"), &artifacts.processed_csv)?;
        fs::write(run_dir.join("results.csv"), &artifacts.results_csv)?;
        for (model, csv) in &artifacts.best_fit {
            let file_name = format!("best_fit_{}.csv", model.to_lowercase());
            fs::write(run_dir.join(file_name), csv)?;
        }

        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join("manifest.json");

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    pub fn load_results_csv(&self, run_id: &str) -> ResultsResult<String> {
        let path = self.run_dir(run_id).join("results.csv");
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        Ok(fs::read_to_string(path)?)
    }

    /// All stored manifests, newest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(run_id: &str, timestamp: &str) -> RunManifest {
        RunManifest {
            run_id: run_id.to_string(),
            dataset: "adsorption.csv".to_string(),
            timestamp: timestamp.to_string(),
            solver_version: "0.1.0".to_string(),
            experiment_count: 2,
            models: vec!["Langmuir".to_string()],
            max_iterations: 1000,
            workers: 1,
            fits_total: 2,
            fits_failed: 0,
            cancelled: false,
        }
    }

    fn artifacts() -> RunArtifacts {
        RunArtifacts {
            processed_csv: "experiment\na\n".to_string(),
            results_csv: "experiment,Langmuir LSS\na,0.1\n".to_string(),
            best_fit: vec![("Langmuir".to_string(), "experiment\na\n".to_string())],
        }
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::for_output_dir(dir.path()).unwrap();

        store.save_run(&manifest("abc", "2026-01-01T00:00:00Z"), &artifacts()).unwrap();
        assert!(store.has_run("abc"));

        let loaded = store.load_manifest("abc").unwrap();
        assert_eq!(loaded.dataset, "adsorption.csv");
        assert_eq!(loaded.models, ["Langmuir"]);

        let results = store.load_results_csv("abc").unwrap();
        assert!(results.contains("Langmuir LSS"));

        let best_fit_path = dir
            .path()
            .join(".adsorbfit/runs/abc/best_fit_langmuir.csv");
        assert!(best_fit_path.exists());
    }

    #[test]
    fn list_runs_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::for_output_dir(dir.path()).unwrap();
        store.save_run(&manifest("old", "2026-01-01T00:00:00Z"), &artifacts()).unwrap();
        store.save_run(&manifest("new", "2026-02-01T00:00:00Z"), &artifacts()).unwrap();

        let runs = store.list_runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_id, "new");
    }

    #[test]
    fn missing_run_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::for_output_dir(dir.path()).unwrap();
        assert!(matches!(
            store.load_manifest("nope"),
            Err(ResultsError::RunNotFound { .. })
        ));
    }

    #[test]
    fn delete_run_removes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::for_output_dir(dir.path()).unwrap();
        store.save_run(&manifest("abc", "t"), &artifacts()).unwrap();
        store.delete_run("abc").unwrap();
        assert!(!store.has_run("abc"));
    }
}
