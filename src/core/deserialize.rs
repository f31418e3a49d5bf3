//! Sheet rows → records

use tracing::debug;

use crate::config::{FormulaValues, ImportOptions, ModelConfig, StatisticsSpec};
use crate::core::index::resolve_import_columns;
use crate::error::SheetMapResult;
use crate::sheet::{Cell, Sheet};
use crate::types::{CellValue, Value};

/// Raw cell content as a [`Value`]; blanks and error cells read as empty.
pub fn cell_to_value(cell: Option<&Cell>, mode: FormulaValues) -> Value {
    cell.map(|cell| content_to_value(&cell.value, mode))
        .unwrap_or_default()
}

fn content_to_value(value: &CellValue, mode: FormulaValues) -> Value {
    match value {
        CellValue::Empty | CellValue::Error(_) => Value::Empty,
        CellValue::Bool(b) => Value::Bool(*b),
        CellValue::Number(n) => Value::Number(*n),
        CellValue::DateTime(dt) => Value::DateTime(*dt),
        CellValue::Text(s) if s.is_empty() => Value::Empty,
        CellValue::Text(s) => Value::Text(s.clone()),
        CellValue::Formula { text, cached } => match (mode, cached) {
            (FormulaValues::Cached, Some(result)) => content_to_value(result, mode),
            _ => Value::Text(text.clone()),
        },
    }
}

/// Header titles: text cells of the first physical row.
fn header_titles<S: Sheet>(sheet: &S, header_row: u32) -> Vec<(u16, String)> {
    sheet
        .row_cells(header_row)
        .into_iter()
        .filter_map(|(col, cell)| match &cell.value {
            CellValue::Text(s) if !s.is_empty() => Some((col, s.clone())),
            _ => None,
        })
        .collect()
}

/// Whether `row` is a synthesized summary row.
///
/// Column 0 must hold a statistics name, and the first formula column of
/// that statistics entry must start with its function name. Only the first
/// listed column is checked.
fn is_statistics_row<S: Sheet>(sheet: &S, row: u32, statistics: &[StatisticsSpec]) -> bool {
    let label = match sheet.cell(row, 0) {
        Some(cell) => cell.value.display().to_lowercase(),
        None => return false,
    };
    let spec = match statistics.iter().find(|s| s.name.to_lowercase() == label) {
        Some(spec) => spec,
        None => return false,
    };
    let first = match spec.columns.first() {
        Some(col) => *col,
        None => return true,
    };
    sheet
        .cell(row, first)
        .map(|cell| {
            cell.value
                .display()
                .to_uppercase()
                .starts_with(&spec.formula.to_uppercase())
        })
        .unwrap_or(false)
}

/// Read records from `sheet`.
///
/// Row 0 is the header; rows at or after `options.start_row` become records.
/// Indices discovered from the header are cached into `model`.
pub fn deserialize_sheet<S, T>(
    sheet: &S,
    model: &mut ModelConfig<T>,
    options: &ImportOptions,
) -> SheetMapResult<Vec<T>>
where
    S: Sheet,
    T: Default,
{
    let rows = sheet.row_numbers();
    let header_row = match rows.first() {
        Some(row) => *row,
        None => return Ok(Vec::new()),
    };
    let data_rows: Vec<u32> = rows
        .iter()
        .copied()
        .filter(|row| *row >= options.start_row)
        .collect();
    if data_rows.is_empty() {
        return Ok(Vec::new());
    }

    let header = header_titles(sheet, header_row);
    let targets = resolve_import_columns(model, &header)?;
    let model = &*model;

    let mut records = Vec::with_capacity(data_rows.len());
    for row in data_rows {
        if row > options.start_row && is_statistics_row(sheet, row, model.statistics()) {
            debug!(sheet = sheet.name(), row, "skipping statistics row");
            continue;
        }

        let mut record = T::default();
        for (position, index) in &targets {
            let column = &model.columns()[*position];
            let raw = cell_to_value(sheet.cell(row, *index), options.formula_values);
            let value = column.convert(raw);
            if value.is_empty() {
                continue;
            }
            column.assign(&mut record, value)?;
        }
        records.push(record);
    }

    debug!(sheet = sheet.name(), records = records.len(), "imported sheet");
    Ok(records)
}
