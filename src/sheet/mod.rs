//! Workbook/sheet capability consumed by the mapping engines
//!
//! The engines never touch a file container directly. They drive the
//! [`Workbook`] and [`Sheet`] traits; [`MemoryWorkbook`] is the bundled
//! implementation, and `crate::excel` moves it to and from `.xlsx`/`.xls`.

mod memory;

pub use memory::{MemorySheet, MemoryWorkbook};

use crate::config::FreezeSpec;
use crate::error::SheetMapResult;
use crate::types::CellValue;

/// Excel sheet name maximum length.
pub const SHEET_NAME_MAX_LEN: usize = 31;
/// Characters not allowed in sheet names.
pub const SHEET_NAME_ILLEGAL: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// Opaque handle to a style registered with a [`Workbook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StyleId(pub usize);

/// Cell style properties the engines ask for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CellStyle {
    /// Native number/date display format.
    pub num_format: Option<String>,
    pub bold: bool,
    pub align_center: bool,
    pub valign_center: bool,
    /// Background fill color as `0xRRGGBB`.
    pub bg_color: Option<u32>,
}

impl CellStyle {
    /// Title row style.
    pub fn header() -> Self {
        Self {
            bold: true,
            align_center: true,
            valign_center: true,
            bg_color: Some(0xD9D9D9),
            ..Default::default()
        }
    }

    pub fn number_format(format: impl Into<String>) -> Self {
        Self {
            num_format: Some(format.into()),
            ..Default::default()
        }
    }

    /// Return a copy with vertical centering switched on (merged anchors).
    pub fn vertically_centered(&self) -> Self {
        Self {
            valign_center: true,
            ..self.clone()
        }
    }
}

/// Rectangular region, zero-based and inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u16,
    pub last_col: u16,
}

impl CellRange {
    pub fn new(first_row: u32, last_row: u32, first_col: u16, last_col: u16) -> Self {
        Self {
            first_row,
            last_row,
            first_col,
            last_col,
        }
    }

    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }
}

/// One stored cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    pub style: Option<StyleId>,
}

/// A single worksheet: rows of cells plus sheet-level view settings.
pub trait Sheet {
    fn name(&self) -> &str;

    /// Physical row numbers in ascending order.
    fn row_numbers(&self) -> Vec<u32>;

    fn cell(&self, row: u32, col: u16) -> Option<&Cell>;

    /// Cells of one row in ascending column order.
    fn row_cells(&self, row: u32) -> Vec<(u16, &Cell)>;

    /// Create the row, replacing any existing content at that position.
    fn create_row(&mut self, row: u32);

    fn set_value(&mut self, row: u32, col: u16, value: CellValue);

    fn set_style(&mut self, row: u32, col: u16, style: Option<StyleId>);

    fn merge(&mut self, range: CellRange) -> SheetMapResult<()>;

    /// Drop merged regions reaching row `from_row` or below.
    fn clear_merged_regions(&mut self, from_row: u32);

    fn set_freeze_pane(&mut self, pane: &FreezeSpec);

    fn set_auto_filter(&mut self, range: CellRange);

    fn auto_size_column(&mut self, col: u16);
}

/// A collection of named sheets plus the styles they share.
pub trait Workbook {
    type Sheet: Sheet;

    fn sheet_names(&self) -> Vec<String>;

    fn sheet(&self, name: &str) -> Option<&Self::Sheet>;

    fn sheet_at(&self, index: usize) -> Option<&Self::Sheet>;

    fn sheet_mut(&mut self, name: &str) -> Option<&mut Self::Sheet>;

    /// Create a sheet and return its actual name. `None` picks a fresh
    /// unique name.
    fn create_sheet(&mut self, name: Option<&str>) -> SheetMapResult<String>;

    /// Register a style; fails when its number format is not a native one.
    fn create_style(&mut self, style: CellStyle) -> SheetMapResult<StyleId>;

    fn style(&self, id: StyleId) -> Option<&CellStyle>;
}
