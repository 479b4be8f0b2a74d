//! The bulk fitting loop.

use crate::cancel::CancelToken;
use crate::config::ResolvedConfigs;
use crate::error::{FitError, FitResult};
use crate::tree::{ModelSeries, ResultsTree};
use af_data::{Experiment, GroupedTable};
use af_solver::{fit_model, FitOutcome};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::sync::Mutex;
use tracing::{info, warn};

/// Progress callback: `(experiments done, experiments total)`.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(usize, usize) + Send);

/// How a bulk run ended. A cancelled run still carries the tree of every
/// experiment that completed before the token was observed.
#[derive(Debug)]
pub enum BulkOutcome {
    Completed(ResultsTree),
    Cancelled(ResultsTree),
}

impl BulkOutcome {
    pub fn tree(&self) -> &ResultsTree {
        match self {
            BulkOutcome::Completed(tree) => tree,
            BulkOutcome::Cancelled(tree) => tree,
        }
    }

    pub fn into_tree(self) -> ResultsTree {
        match self {
            BulkOutcome::Completed(tree) => tree,
            BulkOutcome::Cancelled(tree) => tree,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, BulkOutcome::Cancelled(_))
    }
}

/// Fit every enabled model to every experiment.
///
/// Experiments are processed in the grouped table's order and models in
/// configuration order. `workers == 1` runs on the calling thread; any
/// other value dispatches experiments onto a dedicated rayon pool
/// (`workers == 0` sizes it to the machine). Results are gathered in
/// submission order either way, so the tree layout is identical for every
/// worker count.
///
/// `on_progress` fires exactly once per completed experiment, serialized,
/// with `done` strictly increasing by one. The cancel token is polled
/// before each experiment and between per-model fits; a partially fitted
/// experiment is discarded on cancellation so every model series keeps the
/// same length.
pub fn fit_all(
    grouped: &GroupedTable,
    configs: &ResolvedConfigs,
    workers: usize,
    on_progress: Option<ProgressFn<'_>>,
    cancel: &CancelToken,
) -> FitResult<BulkOutcome> {
    let worker_count = if workers == 0 { num_cpus::get() } else { workers };

    let outcome = if worker_count <= 1 {
        fit_sequential(grouped, configs, on_progress, cancel)
    } else {
        fit_parallel(grouped, configs, worker_count, on_progress, cancel)?
    };

    let tree = outcome.tree();
    info!(
        experiments = tree.experiment_count(),
        fits = tree.fit_count(),
        failed = tree.failed_count(),
        cancelled = outcome.is_cancelled(),
        "bulk fitting finished"
    );
    Ok(outcome)
}

fn fit_sequential(
    grouped: &GroupedTable,
    configs: &ResolvedConfigs,
    mut on_progress: Option<ProgressFn<'_>>,
    cancel: &CancelToken,
) -> BulkOutcome {
    let total = grouped.len();
    let mut per_experiment: Vec<Vec<FitOutcome>> = Vec::with_capacity(total);

    for experiment in &grouped.experiments {
        if cancel.is_cancelled() {
            return BulkOutcome::Cancelled(assemble(configs, per_experiment));
        }
        match fit_experiment(experiment, configs, cancel) {
            Some(outcomes) => {
                per_experiment.push(outcomes);
                if let Some(cb) = on_progress.as_deref_mut() {
                    cb(per_experiment.len(), total);
                }
            }
            None => return BulkOutcome::Cancelled(assemble(configs, per_experiment)),
        }
    }

    BulkOutcome::Completed(assemble(configs, per_experiment))
}

fn fit_parallel(
    grouped: &GroupedTable,
    configs: &ResolvedConfigs,
    worker_count: usize,
    on_progress: Option<ProgressFn<'_>>,
    cancel: &CancelToken,
) -> FitResult<BulkOutcome> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(worker_count)
        .build()
        .map_err(|e| FitError::WorkerPool {
            what: e.to_string(),
        })?;

    struct Progress<'a> {
        done: usize,
        callback: Option<ProgressFn<'a>>,
    }

    let total = grouped.len();
    let progress = Mutex::new(Progress {
        done: 0,
        callback: on_progress,
    });

    // Results are collected in submission order regardless of which worker
    // finishes first; `done` is advanced inside the lock so callbacks stay
    // serialized and strictly monotonic.
    let slots: Vec<Option<Vec<FitOutcome>>> = pool.install(|| {
        grouped
            .experiments
            .par_iter()
            .map(|experiment| {
                if cancel.is_cancelled() {
                    return None;
                }
                let outcomes = fit_experiment(experiment, configs, cancel)?;
                if let Ok(mut guard) = progress.lock() {
                    guard.done += 1;
                    let done = guard.done;
                    if let Some(cb) = guard.callback.as_deref_mut() {
                        cb(done, total);
                    }
                }
                Some(outcomes)
            })
            .collect()
    });

    // A cancelled run keeps the longest completed prefix so the tree stays
    // aligned with the head of the experiment order.
    let mut per_experiment = Vec::with_capacity(slots.len());
    let mut truncated = false;
    for slot in slots {
        match slot {
            Some(outcomes) => per_experiment.push(outcomes),
            None => {
                truncated = true;
                break;
            }
        }
    }

    let tree = assemble(configs, per_experiment);
    Ok(if truncated {
        BulkOutcome::Cancelled(tree)
    } else {
        BulkOutcome::Completed(tree)
    })
}

/// Fit all configured models to one experiment, in configuration order.
/// Returns None when cancellation is observed between model fits; the
/// partially fitted experiment is dropped in that case.
fn fit_experiment(
    experiment: &Experiment,
    configs: &ResolvedConfigs,
    cancel: &CancelToken,
) -> Option<Vec<FitOutcome>> {
    let mut outcomes = Vec::with_capacity(configs.models.len());
    for (i, cfg) in configs.models.iter().enumerate() {
        let outcome = fit_model(
            cfg.model,
            &experiment.pressure,
            &experiment.uptake,
            &cfg.initial,
            &cfg.lower,
            &cfg.upper,
            configs.max_evaluations,
        );
        if let Some(reason) = outcome.failure_reason() {
            warn!(
                experiment = %experiment.name,
                model = %cfg.model,
                reason,
                "fit failed"
            );
        }
        outcomes.push(outcome);

        let more_models_pending = i + 1 < configs.models.len();
        if more_models_pending && cancel.is_cancelled() {
            return None;
        }
    }
    Some(outcomes)
}

fn assemble(configs: &ResolvedConfigs, per_experiment: Vec<Vec<FitOutcome>>) -> ResultsTree {
    let mut series: Vec<ModelSeries> = configs
        .models
        .iter()
        .map(|cfg| ModelSeries {
            model: cfg.model,
            outcomes: Vec::with_capacity(per_experiment.len()),
        })
        .collect();

    for outcomes in per_experiment {
        for (slot, outcome) in outcomes.into_iter().enumerate() {
            series[slot].outcomes.push(outcome);
        }
    }

    ResultsTree { series }
}
