//! Export/import options and workbook document properties

use serde::Deserialize;

/// Default name of the first exported sheet.
pub const DEFAULT_SHEET_NAME: &str = "sheet0";

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}

fn default_max_rows() -> usize {
    usize::MAX
}

fn default_start_row() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportOptions {
    /// Name of page 0; later pages are `<name>_<n>`.
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// Data rows per physical sheet.
    #[serde(default = "default_max_rows")]
    pub max_rows_per_sheet: usize,
    /// Reuse an existing sheet of the same name instead of adding a new one.
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            sheet_name: default_sheet_name(),
            max_rows_per_sheet: default_max_rows(),
            overwrite: false,
        }
    }
}

impl ExportOptions {
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    pub fn with_max_rows_per_sheet(mut self, max_rows: usize) -> Self {
        self.max_rows_per_sheet = max_rows;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// What a formula cell yields on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaValues {
    /// Stored result when the file carries one, else the formula text.
    #[default]
    Cached,
    /// Always the formula text.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportOptions {
    /// First physical data row; row 0 is always the header.
    #[serde(default = "default_start_row")]
    pub start_row: u32,
    #[serde(default)]
    pub sheet_index: usize,
    #[serde(default)]
    pub formula_values: FormulaValues,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            start_row: default_start_row(),
            sheet_index: 0,
            formula_values: FormulaValues::default(),
        }
    }
}

impl ImportOptions {
    pub fn with_start_row(mut self, start_row: u32) -> Self {
        self.start_row = start_row;
        self
    }

    pub fn with_sheet_index(mut self, sheet_index: usize) -> Self {
        self.sheet_index = sheet_index;
        self
    }

    pub fn with_formula_values(mut self, mode: FormulaValues) -> Self {
        self.formula_values = mode;
        self
    }
}

/// Document summary written into new workbooks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorkbookProperties {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

impl WorkbookProperties {
    pub fn is_empty(&self) -> bool {
        self.author.is_none() && self.company.is_none() && self.subject.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let export = ExportOptions::default();
        assert_eq!(export.sheet_name, "sheet0");
        assert_eq!(export.max_rows_per_sheet, usize::MAX);
        assert!(!export.overwrite);

        let import = ImportOptions::default();
        assert_eq!(import.start_row, 1);
        assert_eq!(import.formula_values, FormulaValues::Cached);
    }

    #[test]
    fn test_options_from_yaml() {
        let export: ExportOptions =
            serde_yaml::from_str("sheet_name: Orders\nmax_rows_per_sheet: 500\n").unwrap();
        assert_eq!(export.sheet_name, "Orders");
        assert_eq!(export.max_rows_per_sheet, 500);
        assert!(!export.overwrite);

        let import: ImportOptions = serde_yaml::from_str("formula_values: text\n").unwrap();
        assert_eq!(import.start_row, 1);
        assert_eq!(import.formula_values, FormulaValues::Text);

        let props: WorkbookProperties = serde_yaml::from_str("author: Ops\n").unwrap();
        assert_eq!(props.author.as_deref(), Some("Ops"));
        assert!(!props.is_empty());
    }
}
