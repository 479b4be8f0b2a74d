//! CSV rendering of the grouped and wide tables.
//!
//! Output is UTF-8, comma-separated, with a header row. NaN cells are
//! rendered as empty cells. List-valued columns use the comma-joined
//! series encoding (the csv writer quotes them).

use crate::error::ResultsResult;
use crate::series::join_series;
use crate::wide::WideTable;
use af_data::GroupedTable;

fn number_cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

/// Render the grouped experiment table (the `processed` artifact).
pub fn render_processed_csv(grouped: &GroupedTable) -> ResultsResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "experiment",
        "temperature",
        "pressure",
        "uptake",
        "min pressure",
        "max pressure",
        "min uptake",
        "max uptake",
        "measurements",
    ])?;
    for experiment in &grouped.experiments {
        writer.write_record([
            experiment.name.clone(),
            number_cell(experiment.temperature),
            join_series(&experiment.pressure),
            join_series(&experiment.uptake),
            number_cell(experiment.min_pressure),
            number_cell(experiment.max_pressure),
            number_cell(experiment.min_uptake),
            number_cell(experiment.max_uptake),
            experiment.measurement_count().to_string(),
        ])?;
    }
    finish(writer)
}

/// Render the wide result table.
///
/// Per-model columns are emitted from each descriptor's parameter order:
/// `"{model} {param}"`, `"{model} {param} error"` for every parameter,
/// then `"{model} LSS"`. Best/worst columns come last.
pub fn render_wide_csv(table: &WideTable) -> ResultsResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = [
        "experiment",
        "temperature",
        "pressure",
        "uptake",
        "min pressure",
        "max pressure",
        "min uptake",
        "max uptake",
        "measurements",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for model in &table.models {
        for param in model.param_names() {
            header.push(format!("{} {}", model.name(), param));
            header.push(format!("{} {} error", model.name(), param));
        }
        header.push(format!("{} LSS", model.name()));
    }
    header.push("best model".to_string());
    header.push("worst model".to_string());
    writer.write_record(&header)?;

    for row in &table.rows {
        let mut record: Vec<String> = vec![
            row.experiment.clone(),
            number_cell(row.temperature),
            join_series(&row.pressure),
            join_series(&row.uptake),
            number_cell(row.min_pressure),
            number_cell(row.max_pressure),
            number_cell(row.min_uptake),
            number_cell(row.max_uptake),
            row.measurement_count.to_string(),
        ];
        for cells in &row.cells {
            for (value, error) in cells.params.iter().zip(&cells.std_errors) {
                record.push(number_cell(*value));
                record.push(number_cell(*error));
            }
            record.push(number_cell(cells.lss));
        }
        record.push(row.best_model.clone().unwrap_or_default());
        record.push(row.worst_model.clone().unwrap_or_default());
        writer.write_record(&record)?;
    }

    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> ResultsResult<String> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
