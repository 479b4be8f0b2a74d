//! The ragged results tree, kept rectangular by construction.

use af_models::IsothermModel;
use af_solver::FitOutcome;

/// Outcomes of one model across all fitted experiments, aligned 1:1 with
/// the grouped table's experiment order.
#[derive(Debug, Clone)]
pub struct ModelSeries {
    pub model: IsothermModel,
    pub outcomes: Vec<FitOutcome>,
}

/// Per-model fit outcomes for a whole run, models in configuration order.
#[derive(Debug, Clone, Default)]
pub struct ResultsTree {
    pub series: Vec<ModelSeries>,
}

impl ResultsTree {
    /// Number of experiments covered; every series has this length.
    pub fn experiment_count(&self) -> usize {
        self.series.first().map_or(0, |s| s.outcomes.len())
    }

    pub fn model_count(&self) -> usize {
        self.series.len()
    }

    pub fn series_for(&self, model: IsothermModel) -> Option<&ModelSeries> {
        self.series.iter().find(|s| s.model == model)
    }

    /// Total number of failed fits across all models.
    pub fn failed_count(&self) -> usize {
        self.series
            .iter()
            .flat_map(|s| &s.outcomes)
            .filter(|o| !o.is_converged())
            .count()
    }

    /// Total number of fits attempted.
    pub fn fit_count(&self) -> usize {
        self.series.iter().map(|s| s.outcomes.len()).sum()
    }
}
