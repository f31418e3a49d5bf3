//! Records → sheet rows
//!
//! One page per physical sheet: title row, data rows, merged runs,
//! statistics rows, freeze panes, auto-filters, column widths.

use tracing::{debug, warn};

use crate::config::{ExportOptions, ModelConfig};
use crate::core::format::render_formatted;
use crate::core::formula::{column_letter, range_formula};
use crate::core::index::{resolve_export_columns, ResolvedColumn};
use crate::error::{SheetMapError, SheetMapResult};
use crate::sheet::{CellRange, CellStyle, Sheet, StyleId, Workbook};
use crate::types::{CellValue, Value};

/// First physical data row; row 0 holds the titles.
pub const FIRST_DATA_ROW: u32 = 1;

/// Styles registered once per page for the emitted columns.
struct PageStyles {
    header: Option<StyleId>,
    /// Native number/date style per emission slot.
    columns: Vec<Option<StyleId>>,
    /// Anchor style per emission slot for merged runs.
    merge_anchors: Vec<Option<StyleId>>,
}

/// Name of page `page` for base name `base`: `base`, `base_1`, `base_2`, ...
pub fn page_sheet_name(base: &str, page: usize) -> String {
    if page == 0 {
        base.to_string()
    } else {
        format!("{}_{}", base, page)
    }
}

/// Write `records` into `workbook`, paging by `options.max_rows_per_sheet`.
///
/// `None` records are skipped. At least one sheet (title row only) is
/// written for an empty input. Returns the names of the written sheets.
pub fn serialize_records<'a, W, T, I, R>(
    workbook: &mut W,
    records: I,
    model: &ModelConfig<T>,
    options: &ExportOptions,
) -> SheetMapResult<Vec<String>>
where
    W: Workbook,
    T: 'a,
    I: IntoIterator<Item = R>,
    R: Into<Option<&'a T>>,
{
    if options.sheet_name.trim().is_empty() {
        return Err(SheetMapError::Argument(
            "Sheet name must not be empty".to_string(),
        ));
    }
    if options.max_rows_per_sheet == 0 {
        return Err(SheetMapError::Argument(
            "max_rows_per_sheet must be at least 1".to_string(),
        ));
    }

    let columns = resolve_export_columns(model)?;
    for spec in model.statistics() {
        for col in &spec.columns {
            column_letter(*col)?;
        }
    }

    let records: Vec<&T> = records
        .into_iter()
        .filter_map(|record| -> Option<&'a T> { record.into() })
        .collect();
    let mut pages: Vec<&[&T]> = records.chunks(options.max_rows_per_sheet).collect();
    if pages.is_empty() {
        pages.push(&[]);
    }

    let mut written = Vec::with_capacity(pages.len());
    for (page, chunk) in pages.into_iter().enumerate() {
        let name = page_sheet_name(&options.sheet_name, page);
        let actual = write_page(workbook, chunk, &columns, model, &name, options.overwrite)?;
        debug!(sheet = %actual, rows = chunk.len(), "exported page");
        written.push(actual);
    }
    Ok(written)
}

fn register_styles<W: Workbook, T>(
    workbook: &mut W,
    columns: &[ResolvedColumn<'_, T>],
) -> SheetMapResult<PageStyles> {
    let header = Some(workbook.create_style(CellStyle::header())?);

    let mut column_styles = Vec::with_capacity(columns.len());
    let mut merge_anchors = Vec::with_capacity(columns.len());
    for column in columns {
        let base = match column.config.formatter() {
            Some(formatter) => match workbook.create_style(CellStyle::number_format(formatter)) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(
                        column = column.config.title(),
                        formatter,
                        error = %e,
                        "formatter is not a native number format, writing formatted text"
                    );
                    None
                }
            },
            None => None,
        };

        let anchor = if column.config.allows_merge() {
            let anchor_style = base
                .and_then(|id| workbook.style(id))
                .map(CellStyle::vertically_centered)
                .unwrap_or_else(|| CellStyle::default().vertically_centered());
            Some(workbook.create_style(anchor_style)?)
        } else {
            None
        };

        column_styles.push(base);
        merge_anchors.push(anchor);
    }

    Ok(PageStyles {
        header,
        columns: column_styles,
        merge_anchors,
    })
}

fn target_sheet<W: Workbook>(workbook: &mut W, name: &str, overwrite: bool) -> SheetMapResult<String> {
    match workbook.sheet(name).map(|s| s.name().to_string()) {
        Some(existing) if overwrite => Ok(existing),
        Some(existing) => {
            let fresh = workbook.create_sheet(None)?;
            warn!(requested = %existing, created = %fresh, "sheet exists and overwrite is off, writing to a new sheet");
            Ok(fresh)
        }
        None => workbook.create_sheet(Some(name)),
    }
}

/// Type-directed cell content for one extracted value.
fn cell_content(value: &Value, formatter: Option<&str>, native_style: bool) -> CellValue {
    if !native_style && value.is_formattable() {
        if let Some(text) = formatter.and_then(|f| render_formatted(value, f)) {
            return CellValue::Text(text);
        }
    }
    match value {
        Value::Empty => CellValue::Empty,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::DateTime(dt) => CellValue::DateTime(*dt),
        Value::Int(i) => CellValue::Number(*i as f64),
        Value::Number(n) => CellValue::Number(*n),
        Value::Text(s) => CellValue::Text(s.clone()),
    }
}

/// Maximal runs of equal, non-empty values as inclusive `(start, end)`
/// offsets, only runs of two or more.
pub fn merge_runs(values: &[Value]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=values.len() {
        let continues = i < values.len() && !values[i].is_empty() && values[i] == values[i - 1];
        if !continues {
            if i - start > 1 {
                runs.push((start, i - 1));
            }
            start = i;
        }
    }
    runs
}

fn write_page<W: Workbook, T>(
    workbook: &mut W,
    records: &[&T],
    columns: &[ResolvedColumn<'_, T>],
    model: &ModelConfig<T>,
    name: &str,
    overwrite: bool,
) -> SheetMapResult<String> {
    let styles = register_styles(workbook, columns)?;
    let actual = target_sheet(workbook, name, overwrite)?;
    let sheet = workbook.sheet_mut(&actual).ok_or_else(|| {
        SheetMapError::Export(format!("Sheet '{}' vanished while writing", actual))
    })?;
    // a reused sheet keeps merges from its previous data rows
    sheet.clear_merged_regions(FIRST_DATA_ROW);

    sheet.create_row(0);
    for (slot, column) in columns.iter().enumerate() {
        let slot = slot as u16;
        sheet.set_value(0, slot, CellValue::Text(column.config.title().to_string()));
        sheet.set_style(0, slot, styles.header);
    }

    // values[slot][record] mirrors what was written, for merge detection
    let mut values: Vec<Vec<Value>> = vec![Vec::with_capacity(records.len()); columns.len()];
    let mut row_index = FIRST_DATA_ROW;
    for record in records {
        sheet.create_row(row_index);
        for (slot, column) in columns.iter().enumerate() {
            let value = column.config.extract(record);
            if !value.is_empty() {
                let style = styles.columns[slot];
                let content = cell_content(&value, column.config.formatter(), style.is_some());
                sheet.set_value(row_index, slot as u16, content);
                if style.is_some() {
                    sheet.set_style(row_index, slot as u16, style);
                }
            }
            values[slot].push(value);
        }
        row_index += 1;
    }

    if !records.is_empty() {
        for (slot, column) in columns.iter().enumerate() {
            if !column.config.allows_merge() {
                continue;
            }
            let col = slot as u16;
            for (start, end) in merge_runs(&values[slot]) {
                let first = FIRST_DATA_ROW + start as u32;
                let last = FIRST_DATA_ROW + end as u32;
                sheet.merge(CellRange::new(first, last, col, col))?;
                sheet.set_style(first, col, styles.merge_anchors[slot]);
            }
        }

        for spec in model.statistics() {
            sheet.create_row(row_index);
            sheet.set_value(row_index, 0, CellValue::Text(spec.name.clone()));
            for col in &spec.columns {
                let style = sheet.cell(row_index - 1, *col).and_then(|cell| cell.style);
                let formula = range_formula(&spec.formula, *col, FIRST_DATA_ROW, row_index - 1)?;
                sheet.set_value(row_index, *col, CellValue::formula(formula));
                sheet.set_style(row_index, *col, style);
            }
            row_index += 1;
        }
    }

    for freeze in model.freezes() {
        sheet.set_freeze_pane(freeze);
    }
    for filter in model.filters() {
        sheet.set_auto_filter(CellRange::new(
            filter.first_row,
            filter.last_row.unwrap_or(row_index),
            filter.first_col,
            filter.last_col,
        ));
    }

    for slot in 0..columns.len() {
        sheet.auto_size_column(slot as u16);
    }

    Ok(actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::MemoryWorkbook;

    #[derive(Debug, Clone)]
    struct Sale {
        region: String,
        amount: f64,
    }

    fn sale(region: &str, amount: f64) -> Sale {
        Sale {
            region: region.to_string(),
            amount,
        }
    }

    fn config() -> ModelConfig<Sale> {
        let mut config = ModelConfig::<Sale>::new();
        config
            .property("region", |s: &Sale| s.region.clone(), |s: &mut Sale, v| s.region = v)
            .unwrap()
            .with_index(0)
            .with_title("Region")
            .with_merge(true);
        config
            .property("amount", |s: &Sale| s.amount, |s: &mut Sale, v| s.amount = v)
            .unwrap()
            .with_index(1)
            .with_title("Amount");
        config
    }

    fn text(v: &str) -> Value {
        Value::Text(v.to_string())
    }

    #[test]
    fn test_merge_runs_flush_on_change_and_at_end() {
        let values = vec![text("a"), text("a"), text("a"), text("b"), text("a"), text("a")];
        assert_eq!(merge_runs(&values), vec![(0, 2), (4, 5)]);
    }

    #[test]
    fn test_empty_values_never_merge() {
        let values = vec![Value::Empty, Value::Empty, text("x"), Value::Empty];
        assert!(merge_runs(&values).is_empty());
        assert!(merge_runs(&[]).is_empty());
        assert!(merge_runs(&[text("only")]).is_empty());
    }

    #[test]
    fn test_page_names() {
        assert_eq!(page_sheet_name("sheet0", 0), "sheet0");
        assert_eq!(page_sheet_name("sheet0", 2), "sheet0_2");
    }

    #[test]
    fn test_writes_header_data_and_statistics() {
        let mut config = config();
        config.with_statistics("Total", "SUM", &[1]);
        let sales = vec![sale("north", 10.0), sale("north", 5.5), sale("south", 1.0)];

        let mut book = MemoryWorkbook::new();
        let names = serialize_records(&mut book, &sales, &config, &ExportOptions::default()).unwrap();
        assert_eq!(names, vec!["sheet0".to_string()]);

        let sheet = book.sheet("sheet0").unwrap();
        assert_eq!(sheet.cell(0, 0).unwrap().value, CellValue::Text("Region".into()));
        assert_eq!(sheet.cell(2, 1).unwrap().value, CellValue::Number(5.5));
        assert_eq!(sheet.cell(4, 0).unwrap().value, CellValue::Text("Total".into()));
        assert_eq!(sheet.cell(4, 1).unwrap().value, CellValue::formula("SUM(B2:B4)"));
        assert_eq!(sheet.merged_regions(), &[CellRange::new(1, 2, 0, 0)]);
    }

    #[test]
    fn test_statistics_rows_advance_end_of_data() {
        let mut config = config();
        config
            .with_statistics("Total", "SUM", &[1])
            .with_statistics("Average", "AVERAGE", &[1])
            .with_filter(0, 0, 1, None);
        let sales = vec![sale("a", 1.0), sale("b", 2.0)];

        let mut book = MemoryWorkbook::new();
        serialize_records(&mut book, &sales, &config, &ExportOptions::default()).unwrap();
        let sheet = book.sheet("sheet0").unwrap();
        assert_eq!(sheet.cell(3, 1).unwrap().value, CellValue::formula("SUM(B2:B3)"));
        assert_eq!(sheet.cell(4, 1).unwrap().value, CellValue::formula("AVERAGE(B2:B4)"));
        assert_eq!(sheet.auto_filter(), Some(CellRange::new(0, 5, 0, 1)));
    }

    #[test]
    fn test_empty_input_writes_header_only() {
        let mut config = config();
        config.with_statistics("Total", "SUM", &[1]).with_freeze(0, 1, 0, 1);
        let mut book = MemoryWorkbook::new();
        let none: Vec<Sale> = Vec::new();
        serialize_records(&mut book, &none, &config, &ExportOptions::default()).unwrap();

        let sheet = book.sheet("sheet0").unwrap();
        assert_eq!(sheet.row_numbers(), vec![0]);
        assert!(sheet.merged_regions().is_empty());
        assert!(sheet.freeze_pane().is_some());
    }

    #[test]
    fn test_none_records_are_skipped() {
        let config = config();
        let first = sale("a", 1.0);
        let second = sale("b", 2.0);
        let records = vec![Some(&first), None, Some(&second)];

        let mut book = MemoryWorkbook::new();
        serialize_records(&mut book, records, &config, &ExportOptions::default()).unwrap();
        assert_eq!(book.sheet("sheet0").unwrap().row_numbers(), vec![0, 1, 2]);
    }

    #[test]
    fn test_text_formatter_downgrades_to_text() {
        let mut config = config();
        config.property_mut("amount").unwrap().with_formatter("%.1f EUR");
        let sales = vec![sale("a", 2.26)];

        let mut book = MemoryWorkbook::new();
        serialize_records(&mut book, &sales, &config, &ExportOptions::default()).unwrap();
        let cell = book.sheet("sheet0").unwrap().cell(1, 1).unwrap();
        assert_eq!(cell.value, CellValue::Text("2.3 EUR".into()));
        assert_eq!(cell.style, None);
    }

    #[test]
    fn test_native_formatter_keeps_numbers() {
        let mut config = config();
        config.property_mut("amount").unwrap().with_formatter("0.00");
        let sales = vec![sale("a", 2.25)];

        let mut book = MemoryWorkbook::new();
        serialize_records(&mut book, &sales, &config, &ExportOptions::default()).unwrap();
        let cell = book.sheet("sheet0").unwrap().cell(1, 1).unwrap().clone();
        assert_eq!(cell.value, CellValue::Number(2.25));
        let style = book.style(cell.style.unwrap()).unwrap();
        assert_eq!(style.num_format.as_deref(), Some("0.00"));
    }

    #[test]
    fn test_existing_sheet_without_overwrite_gets_fresh_sheet() {
        let config = config();
        let sales = vec![sale("a", 1.0)];
        let mut book = MemoryWorkbook::new();
        book.create_sheet(Some("sheet0")).unwrap();

        let names = serialize_records(&mut book, &sales, &config, &ExportOptions::default()).unwrap();
        assert_ne!(names[0], "sheet0");
        assert_eq!(book.sheet_names().len(), 2);

        let options = ExportOptions::default().with_overwrite(true);
        let names = serialize_records(&mut book, &sales, &config, &options).unwrap();
        assert_eq!(names, vec!["sheet0".to_string()]);
        assert_eq!(book.sheet_names().len(), 2);
    }

    #[test]
    fn test_overwrite_rewrites_merges_statistics_and_filter() {
        let mut config = config();
        config
            .with_statistics("Total", "SUM", &[1])
            .with_filter(0, 0, 1, None);
        let overwrite = ExportOptions::default().with_overwrite(true);
        let mut book = MemoryWorkbook::new();

        let first = vec![sale("a", 1.0), sale("a", 2.0), sale("b", 3.0)];
        serialize_records(&mut book, &first, &config, &ExportOptions::default()).unwrap();

        let second = vec![sale("c", 1.0), sale("c", 2.0), sale("c", 3.0), sale("d", 4.0)];
        serialize_records(&mut book, &second, &config, &overwrite).unwrap();
        let names = serialize_records(&mut book, &second, &config, &overwrite).unwrap();
        assert_eq!(names, vec!["sheet0".to_string()]);
        assert_eq!(book.sheet_names().len(), 1);

        let sheet = book.sheet("sheet0").unwrap();
        assert_eq!(sheet.merged_regions(), &[CellRange::new(1, 3, 0, 0)]);
        assert_eq!(sheet.cell(5, 0).unwrap().value, CellValue::Text("Total".into()));
        assert_eq!(sheet.cell(5, 1).unwrap().value, CellValue::formula("SUM(B2:B5)"));
        assert_eq!(sheet.auto_filter(), Some(CellRange::new(0, 6, 0, 1)));
    }

    #[test]
    fn test_invalid_arguments() {
        let config = config();
        let sales = vec![sale("a", 1.0)];
        let mut book = MemoryWorkbook::new();

        let zero = ExportOptions::default().with_max_rows_per_sheet(0);
        assert!(matches!(
            serialize_records(&mut book, &sales, &config, &zero),
            Err(SheetMapError::Argument(_))
        ));
        let blank = ExportOptions::default().with_sheet_name(" ");
        assert!(matches!(
            serialize_records(&mut book, &sales, &config, &blank),
            Err(SheetMapError::Argument(_))
        ));
    }

    #[test]
    fn test_statistics_column_beyond_z_is_rejected() {
        let mut config = config();
        config.with_statistics("Total", "SUM", &[26]);
        let mut book = MemoryWorkbook::new();
        let sales = vec![sale("a", 1.0)];
        assert!(matches!(
            serialize_records(&mut book, &sales, &config, &ExportOptions::default()),
            Err(SheetMapError::Configuration(_))
        ));
        assert!(book.sheet_names().is_empty());
    }
}
