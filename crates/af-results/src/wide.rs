//! Wide-table assembly from the results tree.

use crate::error::{ResultsError, ResultsResult};
use af_data::GroupedTable;
use af_fit::ResultsTree;
use af_models::IsothermModel;

/// One model's cells in a wide row: optimal parameters, their standard
/// errors and the residual sum of squares. All NaN for failed fits.
#[derive(Debug, Clone)]
pub struct ModelCells {
    pub params: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub lss: f64,
}

/// One experiment's wide row: the grouped fields plus one `ModelCells`
/// per fitted model, aligned with `WideTable::models`.
#[derive(Debug, Clone)]
pub struct WideRow {
    pub experiment: String,
    pub temperature: f64,
    pub pressure: Vec<f64>,
    pub uptake: Vec<f64>,
    pub min_pressure: f64,
    pub max_pressure: f64,
    pub min_uptake: f64,
    pub max_uptake: f64,
    pub measurement_count: usize,
    pub cells: Vec<ModelCells>,
    pub best_model: Option<String>,
    pub worst_model: Option<String>,
}

/// One row per experiment, in the grouped table's order.
#[derive(Debug, Clone, Default)]
pub struct WideTable {
    pub models: Vec<IsothermModel>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    pub fn model_index(&self, model: IsothermModel) -> Option<usize> {
        self.models.iter().position(|&m| m == model)
    }
}

/// Flatten the results tree against the grouped experiment table.
///
/// Every model series must have the same length. A tree from a cancelled
/// run covers a prefix of the experiments; rows are emitted only for that
/// prefix. Column emission order is driven by each model's descriptor, not
/// by runtime keys.
pub fn adapt(tree: &ResultsTree, grouped: &GroupedTable) -> ResultsResult<WideTable> {
    let covered = if tree.series.is_empty() {
        grouped.len()
    } else {
        tree.experiment_count()
    };
    for series in &tree.series {
        if series.outcomes.len() != covered {
            return Err(ResultsError::ShapeMismatch {
                what: format!(
                    "series {} has {} outcomes, expected {}",
                    series.model,
                    series.outcomes.len(),
                    covered
                ),
            });
        }
    }
    if covered > grouped.len() {
        return Err(ResultsError::ShapeMismatch {
            what: format!(
                "tree covers {} experiments but the table has {}",
                covered,
                grouped.len()
            ),
        });
    }

    let models: Vec<IsothermModel> = tree.series.iter().map(|s| s.model).collect();
    let mut rows = Vec::with_capacity(covered);
    for (i, experiment) in grouped.experiments.iter().take(covered).enumerate() {
        let cells = tree
            .series
            .iter()
            .map(|series| {
                let outcome = &series.outcomes[i];
                ModelCells {
                    params: outcome.params().to_vec(),
                    std_errors: outcome.std_errors().to_vec(),
                    lss: outcome.lss(),
                }
            })
            .collect();
        rows.push(WideRow {
            experiment: experiment.name.clone(),
            temperature: experiment.temperature,
            pressure: experiment.pressure.clone(),
            uptake: experiment.uptake.clone(),
            min_pressure: experiment.min_pressure,
            max_pressure: experiment.max_pressure,
            min_uptake: experiment.min_uptake,
            max_uptake: experiment.max_uptake,
            measurement_count: experiment.measurement_count(),
            cells,
            best_model: None,
            worst_model: None,
        });
    }

    Ok(WideTable { models, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_data::Experiment;
    use af_fit::ModelSeries;
    use af_solver::FitOutcome;

    fn experiment(name: &str) -> Experiment {
        Experiment {
            name: name.to_string(),
            temperature: 300.0,
            pressure: vec![1.0, 2.0],
            uptake: vec![0.1, 0.2],
            min_pressure: 1.0,
            max_pressure: 2.0,
            min_uptake: 0.1,
            max_uptake: 0.2,
        }
    }

    fn converged(params: &[f64], lss: f64) -> FitOutcome {
        FitOutcome::Converged {
            params: params.to_vec(),
            std_errors: vec![0.01; params.len()],
            covariance: None,
            lss,
        }
    }

    #[test]
    fn one_row_per_experiment_in_order() {
        let grouped = GroupedTable {
            experiments: vec![experiment("a"), experiment("b")],
        };
        let tree = ResultsTree {
            series: vec![ModelSeries {
                model: IsothermModel::Langmuir,
                outcomes: vec![converged(&[0.5, 2.0], 1e-10), converged(&[0.6, 2.5], 2e-10)],
            }],
        };
        let wide = adapt(&tree, &grouped).unwrap();
        assert_eq!(wide.rows.len(), 2);
        assert_eq!(wide.rows[0].experiment, "a");
        assert_eq!(wide.rows[1].experiment, "b");
        assert_eq!(wide.rows[1].cells[0].params, [0.6, 2.5]);
    }

    #[test]
    fn failed_fit_yields_nan_cells() {
        let grouped = GroupedTable {
            experiments: vec![experiment("a")],
        };
        let tree = ResultsTree {
            series: vec![ModelSeries {
                model: IsothermModel::Temkin,
                outcomes: vec![FitOutcome::failed(2, "domain error".to_string())],
            }],
        };
        let wide = adapt(&tree, &grouped).unwrap();
        let cells = &wide.rows[0].cells[0];
        assert!(cells.params.iter().all(|v| v.is_nan()));
        assert!(cells.lss.is_nan());
    }

    #[test]
    fn cancelled_prefix_is_adapted() {
        let grouped = GroupedTable {
            experiments: vec![experiment("a"), experiment("b"), experiment("c")],
        };
        let tree = ResultsTree {
            series: vec![ModelSeries {
                model: IsothermModel::Langmuir,
                outcomes: vec![converged(&[0.5, 2.0], 0.0)],
            }],
        };
        let wide = adapt(&tree, &grouped).unwrap();
        assert_eq!(wide.rows.len(), 1);
        assert_eq!(wide.rows[0].experiment, "a");
    }

    #[test]
    fn ragged_series_is_rejected() {
        let grouped = GroupedTable {
            experiments: vec![experiment("a")],
        };
        let tree = ResultsTree {
            series: vec![
                ModelSeries {
                    model: IsothermModel::Langmuir,
                    outcomes: vec![converged(&[0.5, 2.0], 0.0)],
                },
                ModelSeries {
                    model: IsothermModel::Sips,
                    outcomes: vec![],
                },
            ],
        };
        assert!(matches!(
            adapt(&tree, &grouped),
            Err(ResultsError::ShapeMismatch { .. })
        ));
    }
}
