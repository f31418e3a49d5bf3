//! `.xls`/`.xlsx` → in-memory workbook via `calamine`

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{
    open_workbook_auto, open_workbook_auto_from_rs, Data, Dimensions, Range, Reader, Sheets,
};
use chrono::{DateTime, NaiveDateTime};
use tracing::{debug, warn};

use crate::error::{SheetMapError, SheetMapResult};
use crate::sheet::{CellRange, MemorySheet, MemoryWorkbook, Sheet};
use crate::types::CellValue;

/// Decodes spreadsheet containers into a [`MemoryWorkbook`].
///
/// Values, formulas and merged regions are kept. Styles, freeze panes,
/// auto-filters and column widths are not.
pub struct WorkbookDecoder;

impl WorkbookDecoder {
    /// Open `path`, format chosen from its extension.
    pub fn read_path(path: &Path) -> SheetMapResult<MemoryWorkbook> {
        if !path.exists() {
            return Err(SheetMapError::NotFound(path.to_path_buf()));
        }
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| SheetMapError::Import(format!("Failed to open Excel file: {}", e)))?;
        Self::decode(&mut workbook)
    }

    /// Decode an in-memory file, format sniffed from its content.
    pub fn read_bytes(bytes: Vec<u8>) -> SheetMapResult<MemoryWorkbook> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| SheetMapError::Import(format!("Failed to open Excel data: {}", e)))?;
        Self::decode(&mut workbook)
    }

    fn decode<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> SheetMapResult<MemoryWorkbook> {
        let mut book = MemoryWorkbook::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| SheetMapError::Import(format!("Failed to read sheet '{}': {}", name, e)))?;
            // Formula ranges are missing for some containers; values still load
            let formulas = workbook.worksheet_formula(&name).ok();

            let mut sheet = Self::process_sheet(&name, &range, formulas.as_ref());
            for region in Self::merged_regions(workbook, &name) {
                if let Err(e) = sheet.merge(region) {
                    warn!(sheet = %name, error = %e, "skipping merged region");
                }
            }
            debug!(
                sheet = %name,
                rows = sheet.row_count(),
                merged = sheet.merged_regions().len(),
                "decoded sheet"
            );
            book.push_sheet(sheet);
        }
        Ok(book)
    }

    /// Merged regions of `name`; containers without merge data yield none.
    fn merged_regions<RS: Read + Seek>(workbook: &mut Sheets<RS>, name: &str) -> Vec<CellRange> {
        let regions = match workbook {
            Sheets::Xlsx(xlsx) => match xlsx.worksheet_merge_cells(name) {
                Some(Ok(regions)) => regions,
                Some(Err(e)) => {
                    warn!(sheet = %name, error = %e, "failed to read merged regions");
                    Vec::new()
                }
                None => Vec::new(),
            },
            Sheets::Xls(xls) => xls.worksheet_merge_cells(name).unwrap_or_default(),
            _ => Vec::new(),
        };
        regions.iter().map(Self::to_range).collect()
    }

    fn to_range(region: &Dimensions) -> CellRange {
        CellRange::new(
            region.start.0,
            region.end.0,
            region.start.1 as u16,
            region.end.1 as u16,
        )
    }

    fn process_sheet(name: &str, range: &Range<Data>, formulas: Option<&Range<String>>) -> MemorySheet {
        let mut sheet = MemorySheet::new(name);

        let mut formula_cells: HashMap<(u32, u16), String> = HashMap::new();
        if let Some(formulas) = formulas {
            let (row0, col0) = formulas.start().unwrap_or((0, 0));
            for (row, col, text) in formulas.cells() {
                if !text.is_empty() {
                    formula_cells.insert((row0 + row as u32, (col0 as usize + col) as u16), text.clone());
                }
            }
        }

        let (row0, col0) = range.start().unwrap_or((0, 0));
        for (row, col, data) in range.cells() {
            let position = (row0 + row as u32, (col0 as usize + col) as u16);
            let value = Self::convert_data(data);
            let value = match formula_cells.remove(&position) {
                Some(text) => CellValue::Formula {
                    text,
                    cached: (!value.is_empty()).then(|| Box::new(value)),
                },
                None => value,
            };
            if !value.is_empty() {
                sheet.set_value(position.0, position.1, value);
            }
        }

        // Formulas outside the value range have no cached result
        for ((row, col), text) in formula_cells {
            sheet.set_value(row, col, CellValue::Formula { text, cached: None });
        }

        sheet
    }

    /// Map one calamine cell onto [`CellValue`].
    fn convert_data(data: &Data) -> CellValue {
        match data {
            Data::Empty => CellValue::Empty,
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(dt) => CellValue::DateTime(dt),
                None => CellValue::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => Self::parse_iso_datetime(s)
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(s.clone())),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
            #[allow(unreachable_patterns)]
            _ => CellValue::Empty,
        }
    }

    fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::WorkbookEncoder;
    use crate::sheet::Workbook;
    use calamine::CellErrorType;

    #[test]
    fn test_convert_scalar_data() {
        assert_eq!(WorkbookDecoder::convert_data(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(
            WorkbookDecoder::convert_data(&Data::String("x".to_string())),
            CellValue::Text("x".to_string())
        );
        assert_eq!(WorkbookDecoder::convert_data(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(WorkbookDecoder::convert_data(&Data::Empty), CellValue::Empty);
        assert!(matches!(
            WorkbookDecoder::convert_data(&Data::Error(CellErrorType::Div0)),
            CellValue::Error(_)
        ));
    }

    #[test]
    fn test_convert_iso_datetime() {
        let value = WorkbookDecoder::convert_data(&Data::DateTimeIso("2025-02-03T04:05:06".to_string()));
        match value {
            CellValue::DateTime(dt) => assert_eq!(dt.to_string(), "2025-02-03 04:05:06"),
            other => panic!("expected a date, got {:?}", other),
        }
    }

    #[test]
    fn test_merged_regions_survive_decoding() {
        let mut book = MemoryWorkbook::new();
        book.create_sheet(Some("data")).unwrap();
        let sheet = book.sheet_mut("data").unwrap();
        for row in 0..4 {
            sheet.set_value(row, 0, CellValue::Text("x".to_string()));
        }
        sheet.merge(CellRange::new(1, 3, 0, 0)).unwrap();

        let bytes = WorkbookEncoder::new(&book).to_bytes().unwrap();
        let decoded = WorkbookDecoder::read_bytes(bytes).unwrap();
        let sheet = decoded.sheet("data").unwrap();
        assert_eq!(sheet.merged_regions(), &[CellRange::new(1, 3, 0, 0)]);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = WorkbookDecoder::read_path(Path::new("definitely/missing.xlsx")).unwrap_err();
        assert!(matches!(err, SheetMapError::NotFound(_)));
    }

    #[test]
    fn test_garbage_bytes_fail_to_import() {
        let err = WorkbookDecoder::read_bytes(b"not a spreadsheet".to_vec()).unwrap_err();
        assert!(matches!(err, SheetMapError::Import(_)));
    }
}
