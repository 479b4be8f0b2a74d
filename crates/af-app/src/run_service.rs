//! Run execution service: the full preprocess → fit → adapt → persist
//! pipeline behind one call.

use std::path::PathBuf;
use std::time::Instant;

use af_data::{preprocess, GroupedTable, PreprocessSummary, RawTable};
use af_fit::{fit_all, resolve_configs, CancelToken, FitSettings, ResolvedConfigs};
use af_results::{
    best_fit_subset, compute_run_id, render_processed_csv, render_wide_csv, select_best,
    RunArtifacts, RunManifest, RunStore, WideTable,
};
use tracing::info;

use crate::error::AppResult;
use crate::progress::{FittingProgress, RunProgressEvent, RunStage};

/// Version stamped into run ids and manifests; bump when solver behavior
/// changes so old runs are not mistaken for reproductions.
pub const SOLVER_VERSION: &str = "0.1.0";

/// Request to execute a fitting run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub dataset_path: PathBuf,
    pub settings: FitSettings,
    /// Directory under which `.adsorbfit/runs` is created
    pub out_dir: PathBuf,
}

/// Response from a run execution.
#[derive(Debug)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub summary: PreprocessSummary,
    pub wide_table: WideTable,
    pub cancelled: bool,
}

type ProgressCb<'a> = Option<&'a mut (dyn FnMut(RunProgressEvent) + Send)>;

fn emit_progress(
    progress_cb: &mut ProgressCb<'_>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    fitting: Option<FittingProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            fitting,
        });
    }
}

/// Execute a run without progress reporting or cancellation.
pub fn execute_run(request: &RunRequest) -> AppResult<RunResponse> {
    execute_run_with_progress(request, None, &CancelToken::new())
}

/// Execute a run, streaming staged progress events.
///
/// A cancelled run is not an error: partial results are adapted and
/// persisted, and the response carries `cancelled = true`.
pub fn execute_run_with_progress(
    request: &RunRequest,
    mut progress_cb: ProgressCb<'_>,
    cancel: &CancelToken,
) -> AppResult<RunResponse> {
    let started = Instant::now();

    emit_progress(
        &mut progress_cb,
        RunStage::LoadingDataset,
        started,
        Some(format!("Loading {}", request.dataset_path.display())),
        None,
    );

    let content = std::fs::read_to_string(&request.dataset_path).map_err(|source| {
        crate::error::AppError::DatasetFileRead {
            path: request.dataset_path.clone(),
            source,
        }
    })?;
    let table = RawTable::read_csv_str(&content)?;

    // Configuration errors fail the run before any fitting
    let configs = resolve_configs(&request.settings)?;

    emit_progress(
        &mut progress_cb,
        RunStage::Preprocessing,
        started,
        Some("Preprocessing dataset".to_string()),
        None,
    );
    let (grouped, summary) = preprocess(&table, &request.settings.columns)?;
    info!(
        experiments = summary.experiment_count,
        measurements = summary.measurement_count,
        dropped_missing = summary.rows_dropped_missing,
        dropped_invalid = summary.rows_dropped_invalid,
        "dataset preprocessed"
    );

    let run_id = compute_run_id(content.as_bytes(), &request.settings, SOLVER_VERSION);

    let outcome = {
        let mut fit_cb = |done: usize, total: usize| {
            emit_progress(
                &mut progress_cb,
                RunStage::Fitting,
                started,
                None,
                Some(FittingProgress { done, total }),
            );
        };
        fit_all(
            &grouped,
            &configs,
            request.settings.workers,
            Some(&mut fit_cb),
            cancel,
        )?
    };
    let cancelled = outcome.is_cancelled();
    let tree = outcome.into_tree();
    let fits_total = tree.fit_count();
    let fits_failed = tree.failed_count();

    emit_progress(
        &mut progress_cb,
        RunStage::AdaptingResults,
        started,
        Some("Adapting results".to_string()),
        None,
    );
    let wide_table = select_best(af_results::adapt(&tree, &grouped)?);

    emit_progress(
        &mut progress_cb,
        RunStage::SavingResults,
        started,
        Some("Saving results".to_string()),
        None,
    );
    let manifest = build_manifest(
        request,
        &run_id,
        &configs,
        &grouped,
        fits_total,
        fits_failed,
        cancelled,
    );
    let artifacts = build_artifacts(&request.settings, &grouped, &wide_table)?;
    let store = RunStore::for_output_dir(&request.out_dir)?;
    store.save_run(&manifest, &artifacts)?;
    info!(run_id = %run_id, cancelled, "run persisted");

    emit_progress(&mut progress_cb, RunStage::Completed, started, None, None);

    Ok(RunResponse {
        run_id,
        manifest,
        summary,
        wide_table,
        cancelled,
    })
}

fn build_manifest(
    request: &RunRequest,
    run_id: &str,
    configs: &ResolvedConfigs,
    grouped: &GroupedTable,
    fits_total: usize,
    fits_failed: usize,
    cancelled: bool,
) -> RunManifest {
    let dataset = request
        .dataset_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| request.dataset_path.display().to_string());
    RunManifest {
        run_id: run_id.to_string(),
        dataset,
        timestamp: chrono::Utc::now().to_rfc3339(),
        solver_version: SOLVER_VERSION.to_string(),
        experiment_count: grouped.len(),
        models: configs
            .models
            .iter()
            .map(|c| c.model.name().to_string())
            .collect(),
        max_iterations: configs.max_evaluations,
        workers: request.settings.workers,
        fits_total,
        fits_failed,
        cancelled,
    }
}

fn build_artifacts(
    settings: &FitSettings,
    grouped: &GroupedTable,
    wide_table: &WideTable,
) -> AppResult<RunArtifacts> {
    let mut artifacts = RunArtifacts {
        processed_csv: render_processed_csv(grouped)?,
        results_csv: render_wide_csv(wide_table)?,
        best_fit: Vec::new(),
    };
    if settings.save_best {
        for &model in &wide_table.models {
            let subset = best_fit_subset(wide_table, model);
            artifacts
                .best_fit
                .push((model.name().to_string(), render_wide_csv(&subset)?));
        }
    }
    Ok(artifacts)
}
