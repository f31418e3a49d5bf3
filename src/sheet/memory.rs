//! In-memory workbook model

use std::collections::BTreeMap;

use crate::config::{FreezeSpec, WorkbookProperties};
use crate::core::format::is_native_number_format;
use crate::error::{SheetMapError, SheetMapResult};
use crate::sheet::{
    Cell, CellRange, CellStyle, Sheet, StyleId, Workbook, SHEET_NAME_ILLEGAL, SHEET_NAME_MAX_LEN,
};
use crate::types::CellValue;

const WIDTH_MIN: f64 = 8.0;
const WIDTH_MAX: f64 = 60.0;
const WIDTH_PADDING: f64 = 2.0;

#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    name: String,
    rows: BTreeMap<u32, BTreeMap<u16, Cell>>,
    merged: Vec<CellRange>,
    freeze: Option<FreezeSpec>,
    auto_filter: Option<CellRange>,
    column_widths: BTreeMap<u16, f64>,
}

impl MemorySheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged
    }

    pub fn freeze_pane(&self) -> Option<&FreezeSpec> {
        self.freeze.as_ref()
    }

    pub fn auto_filter(&self) -> Option<CellRange> {
        self.auto_filter
    }

    pub fn column_width(&self, col: u16) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    pub fn column_widths(&self) -> &BTreeMap<u16, f64> {
        &self.column_widths
    }

    /// Number of physical rows holding at least one cell entry.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// All stored cells as `(row, col, cell)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u16, &Cell)> {
        self.rows
            .iter()
            .flat_map(|(row, cells)| cells.iter().map(move |(col, cell)| (*row, *col, cell)))
    }
}

/// Display width in character cells; CJK and other wide glyphs count twice.
fn display_width(text: &str) -> f64 {
    text.chars()
        .map(|c| if (c as u32) >= 0x2E80 { 2.0 } else { 1.0 })
        .sum()
}

impl Sheet for MemorySheet {
    fn name(&self) -> &str {
        &self.name
    }

    fn row_numbers(&self) -> Vec<u32> {
        self.rows.keys().copied().collect()
    }

    fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.rows.get(&row).and_then(|cells| cells.get(&col))
    }

    fn row_cells(&self, row: u32) -> Vec<(u16, &Cell)> {
        self.rows
            .get(&row)
            .map(|cells| cells.iter().map(|(col, cell)| (*col, cell)).collect())
            .unwrap_or_default()
    }

    fn create_row(&mut self, row: u32) {
        self.rows.insert(row, BTreeMap::new());
    }

    fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        self.rows
            .entry(row)
            .or_default()
            .entry(col)
            .or_default()
            .value = value;
    }

    fn set_style(&mut self, row: u32, col: u16, style: Option<StyleId>) {
        self.rows
            .entry(row)
            .or_default()
            .entry(col)
            .or_default()
            .style = style;
    }

    fn merge(&mut self, range: CellRange) -> SheetMapResult<()> {
        if range.first_row > range.last_row || range.first_col > range.last_col {
            return Err(SheetMapError::Argument(format!(
                "Invalid merge region {:?}",
                range
            )));
        }
        if let Some(existing) = self.merged.iter().find(|m| m.overlaps(&range)) {
            return Err(SheetMapError::Argument(format!(
                "Merge region {:?} overlaps {:?}",
                range, existing
            )));
        }
        self.merged.push(range);
        Ok(())
    }

    fn clear_merged_regions(&mut self, from_row: u32) {
        self.merged.retain(|region| region.last_row < from_row);
    }

    fn set_freeze_pane(&mut self, pane: &FreezeSpec) {
        self.freeze = Some(pane.clone());
    }

    fn set_auto_filter(&mut self, range: CellRange) {
        self.auto_filter = Some(range);
    }

    fn auto_size_column(&mut self, col: u16) {
        let longest = self
            .rows
            .values()
            .filter_map(|cells| cells.get(&col))
            .map(|cell| display_width(&cell.value.display()))
            .fold(0.0, f64::max);
        let width = (longest + WIDTH_PADDING).clamp(WIDTH_MIN, WIDTH_MAX);
        self.column_widths.insert(col, width);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
    styles: Vec<CellStyle>,
    properties: WorkbookProperties,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[MemorySheet] {
        &self.sheets
    }

    pub fn styles(&self) -> &[CellStyle] {
        &self.styles
    }

    pub fn properties(&self) -> &WorkbookProperties {
        &self.properties
    }

    pub fn set_properties(&mut self, properties: WorkbookProperties) {
        self.properties = properties;
    }

    /// Append an already populated sheet (used by the importer).
    pub(crate) fn push_sheet(&mut self, sheet: MemorySheet) {
        self.sheets.push(sheet);
    }

    fn validate_sheet_name(&self, name: &str) -> SheetMapResult<()> {
        if name.trim().is_empty() {
            return Err(SheetMapError::Argument(
                "Sheet name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > SHEET_NAME_MAX_LEN {
            return Err(SheetMapError::Argument(format!(
                "Sheet name '{}' exceeds {} characters",
                name, SHEET_NAME_MAX_LEN
            )));
        }
        if let Some(c) = name.chars().find(|c| SHEET_NAME_ILLEGAL.contains(c)) {
            return Err(SheetMapError::Argument(format!(
                "Sheet name '{}' contains illegal character '{}'",
                name, c
            )));
        }
        if self.sheet(name).is_some() {
            return Err(SheetMapError::Argument(format!(
                "Sheet '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    fn next_sheet_name(&self) -> String {
        let mut n = self.sheets.len();
        loop {
            let candidate = format!("Sheet{}", n);
            if self.sheet(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

impl Workbook for MemoryWorkbook {
    type Sheet = MemorySheet;

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    fn sheet_at(&self, index: usize) -> Option<&MemorySheet> {
        self.sheets.get(index)
    }

    fn sheet_mut(&mut self, name: &str) -> Option<&mut MemorySheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    fn create_sheet(&mut self, name: Option<&str>) -> SheetMapResult<String> {
        let name = match name {
            Some(name) => {
                self.validate_sheet_name(name)?;
                name.to_string()
            }
            None => self.next_sheet_name(),
        };
        self.sheets.push(MemorySheet::new(name.clone()));
        Ok(name)
    }

    fn create_style(&mut self, style: CellStyle) -> SheetMapResult<StyleId> {
        if let Some(format) = &style.num_format {
            if !is_native_number_format(format) {
                return Err(SheetMapError::UnsupportedFormat(format!(
                    "'{}' is not a spreadsheet number format",
                    format
                )));
            }
        }
        if let Some(pos) = self.styles.iter().position(|s| *s == style) {
            return Ok(StyleId(pos));
        }
        self.styles.push(style);
        Ok(StyleId(self.styles.len() - 1))
    }

    fn style(&self, id: StyleId) -> Option<&CellStyle> {
        self.styles.get(id.0)
    }
}
