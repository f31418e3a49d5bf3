//! In-memory workbook → `.xlsx` via `rust_xlsxwriter`

use std::path::Path;

use chrono::NaiveDateTime;
use rust_xlsxwriter::{Color, DocProperties, Format, FormatAlign, Formula, Workbook, Worksheet};

use crate::config::WorkbookProperties;
use crate::error::{SheetMapError, SheetMapResult};
use crate::sheet::{Cell, CellStyle, MemorySheet, MemoryWorkbook, Sheet};
use crate::types::CellValue;

/// Display format for date cells written without a column formatter.
const DEFAULT_DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Encodes a [`MemoryWorkbook`] as an OOXML workbook.
pub struct WorkbookEncoder<'a> {
    source: &'a MemoryWorkbook,
}

impl<'a> WorkbookEncoder<'a> {
    pub fn new(source: &'a MemoryWorkbook) -> Self {
        Self { source }
    }

    /// Encode and write to `output_path`.
    pub fn save(&self, output_path: &Path) -> SheetMapResult<()> {
        let mut workbook = self.build()?;
        workbook
            .save(output_path)
            .map_err(|e| SheetMapError::Export(format!("Failed to save Excel file: {}", e)))?;
        Ok(())
    }

    /// Encode into an in-memory `.xlsx` buffer.
    pub fn to_bytes(&self) -> SheetMapResult<Vec<u8>> {
        let mut workbook = self.build()?;
        workbook
            .save_to_buffer()
            .map_err(|e| SheetMapError::Export(format!("Failed to encode Excel file: {}", e)))
    }

    fn build(&self) -> SheetMapResult<Workbook> {
        let mut workbook = Workbook::new();

        let properties = self.source.properties();
        if !properties.is_empty() {
            workbook.set_properties(&Self::doc_properties(properties));
        }

        let formats: Vec<Format> = self.source.styles().iter().map(Self::format).collect();
        let datetime_format = Format::new().set_num_format(DEFAULT_DATETIME_FORMAT);

        for sheet in self.source.sheets() {
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(sheet.name())
                .map_err(|e| SheetMapError::Export(format!("Failed to set worksheet name: {}", e)))?;
            Self::export_sheet(worksheet, sheet, &formats, &datetime_format)?;
        }

        Ok(workbook)
    }

    fn doc_properties(properties: &WorkbookProperties) -> DocProperties {
        let mut doc = DocProperties::new();
        if let Some(author) = &properties.author {
            doc = doc.set_author(author);
        }
        if let Some(company) = &properties.company {
            doc = doc.set_company(company);
        }
        if let Some(subject) = &properties.subject {
            doc = doc.set_subject(subject);
        }
        doc
    }

    fn format(style: &CellStyle) -> Format {
        let mut format = Format::new();
        if let Some(num_format) = &style.num_format {
            format = format.set_num_format(num_format);
        }
        if style.bold {
            format = format.set_bold();
        }
        if style.align_center {
            format = format.set_align(FormatAlign::Center);
        }
        if style.valign_center {
            format = format.set_align(FormatAlign::VerticalCenter);
        }
        if let Some(color) = style.bg_color {
            format = format.set_background_color(Color::RGB(color));
        }
        format
    }

    fn export_sheet(
        worksheet: &mut Worksheet,
        sheet: &MemorySheet,
        formats: &[Format],
        datetime_format: &Format,
    ) -> SheetMapResult<()> {
        // Merge first: merge_range writes a placeholder into the anchor cell
        // that the real value below replaces.
        for region in sheet.merged_regions() {
            let format = sheet
                .cell(region.first_row, region.first_col)
                .and_then(|cell| cell.style)
                .and_then(|id| formats.get(id.0))
                .cloned()
                .unwrap_or_else(Format::new);
            worksheet
                .merge_range(
                    region.first_row,
                    region.first_col,
                    region.last_row,
                    region.last_col,
                    "",
                    &format,
                )
                .map_err(|e| SheetMapError::Export(format!("Failed to merge cells: {}", e)))?;
        }

        for (row, col, cell) in sheet.cells() {
            Self::write_cell(worksheet, row, col, cell, formats, datetime_format)?;
        }

        if let Some(pane) = sheet.freeze_pane() {
            if pane.row_split > 0 || pane.col_split > 0 {
                worksheet
                    .set_freeze_panes(pane.row_split, pane.col_split)
                    .map_err(|e| SheetMapError::Export(format!("Failed to freeze panes: {}", e)))?;
                worksheet
                    .set_freeze_panes_top_cell(pane.top_row, pane.left_most_column)
                    .map_err(|e| SheetMapError::Export(format!("Failed to freeze panes: {}", e)))?;
            }
        }

        if let Some(range) = sheet.auto_filter() {
            worksheet
                .autofilter(range.first_row, range.first_col, range.last_row, range.last_col)
                .map_err(|e| SheetMapError::Export(format!("Failed to set auto filter: {}", e)))?;
        }

        for (col, width) in sheet.column_widths() {
            worksheet
                .set_column_width(*col, *width)
                .map_err(|e| SheetMapError::Export(format!("Failed to set column width: {}", e)))?;
        }

        Ok(())
    }

    fn write_cell(
        worksheet: &mut Worksheet,
        row: u32,
        col: u16,
        cell: &Cell,
        formats: &[Format],
        datetime_format: &Format,
    ) -> SheetMapResult<()> {
        let format = cell.style.and_then(|id| formats.get(id.0));
        let result = match (&cell.value, format) {
            (CellValue::Empty, Some(format)) => worksheet.write_blank(row, col, format),
            (CellValue::Empty, None) => return Ok(()),
            (CellValue::Bool(b), Some(format)) => worksheet.write_boolean_with_format(row, col, *b, format),
            (CellValue::Bool(b), None) => worksheet.write_boolean(row, col, *b),
            (CellValue::Number(n), Some(format)) => worksheet.write_number_with_format(row, col, *n, format),
            (CellValue::Number(n), None) => worksheet.write_number(row, col, *n),
            (CellValue::DateTime(dt), format) => {
                Self::write_datetime(worksheet, row, col, dt, format.unwrap_or(datetime_format))
            }
            (CellValue::Text(s), Some(format)) => worksheet.write_string_with_format(row, col, s, format),
            (CellValue::Text(s), None) => worksheet.write_string(row, col, s),
            (CellValue::Formula { text, cached }, format) => {
                let mut formula = Formula::new(text);
                if let Some(result) = cached {
                    formula = formula.set_result(result.display());
                }
                match format {
                    Some(format) => worksheet.write_formula_with_format(row, col, formula, format),
                    None => worksheet.write_formula(row, col, formula),
                }
            }
            (CellValue::Error(e), _) => worksheet.write_string(row, col, e),
        };
        result
            .map(|_| ())
            .map_err(|e| SheetMapError::Export(format!("Failed to write cell ({}, {}): {}", row, col, e)))
    }

    fn write_datetime<'w>(
        worksheet: &'w mut Worksheet,
        row: u32,
        col: u16,
        dt: &NaiveDateTime,
        format: &Format,
    ) -> Result<&'w mut Worksheet, rust_xlsxwriter::XlsxError> {
        worksheet.write_datetime_with_format(row, col, dt, format)
    }
}
