//! Best/worst model selection.

use crate::wide::{WideRow, WideTable};

/// Annotate every row with its best and worst model by residual score.
///
/// Only finite LSS values compete; a NaN score (failed fit) can never win
/// either title. Ties take the earlier model in configuration order. Rows
/// where every model failed keep `None`. Applying the function twice is a
/// no-op.
pub fn select_best(mut table: WideTable) -> WideTable {
    let names: Vec<String> = table.models.iter().map(|m| m.name().to_string()).collect();
    for row in &mut table.rows {
        let (best, worst) = pick(row, &names);
        row.best_model = best;
        row.worst_model = worst;
    }
    table
}

fn pick(row: &WideRow, names: &[String]) -> (Option<String>, Option<String>) {
    let mut best: Option<(usize, f64)> = None;
    let mut worst: Option<(usize, f64)> = None;
    for (i, cells) in row.cells.iter().enumerate() {
        if !cells.lss.is_finite() {
            continue;
        }
        if best.map_or(true, |(_, lss)| cells.lss < lss) {
            best = Some((i, cells.lss));
        }
        if worst.map_or(true, |(_, lss)| cells.lss > lss) {
            worst = Some((i, cells.lss));
        }
    }
    (
        best.map(|(i, _)| names[i].clone()),
        worst.map(|(i, _)| names[i].clone()),
    )
}

/// Rows whose best model is `model`, restricted to that model's cells.
///
/// The subset keeps the grouped experiment fields and the winning model's
/// parameter/error/LSS columns; other models' cells are dropped.
pub fn best_fit_subset(table: &WideTable, model: af_models::IsothermModel) -> WideTable {
    let Some(index) = table.model_index(model) else {
        return WideTable::default();
    };
    let name = model.name();
    let rows = table
        .rows
        .iter()
        .filter(|row| row.best_model.as_deref() == Some(name))
        .map(|row| {
            let mut subset = row.clone();
            subset.cells = vec![row.cells[index].clone()];
            subset
        })
        .collect();
    WideTable {
        models: vec![model],
        rows,
    }
}
