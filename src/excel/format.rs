//! Container format selected by file extension

use std::fmt;
use std::path::Path;

use crate::error::{SheetMapError, SheetMapResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// Legacy BIFF8 container (`.xls`), read-only here.
    Xls,
    /// Office Open XML container (`.xlsx`).
    Xlsx,
}

impl WorkbookFormat {
    /// Pick the format from the extension of `path` (case-insensitive).
    pub fn from_path(path: &Path) -> SheetMapResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("xls") => Ok(WorkbookFormat::Xls),
            Some("xlsx") => Ok(WorkbookFormat::Xlsx),
            _ => Err(SheetMapError::UnsupportedFormat(format!(
                "'{}' is not an .xls or .xlsx file",
                path.display()
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            WorkbookFormat::Xls => "xls",
            WorkbookFormat::Xlsx => "xlsx",
        }
    }

    /// Fail unless the bundled encoder can produce this container.
    pub fn ensure_writable(&self) -> SheetMapResult<()> {
        match self {
            WorkbookFormat::Xlsx => Ok(()),
            WorkbookFormat::Xls => Err(SheetMapError::UnsupportedFormat(
                "writing the legacy .xls container is not supported, use .xlsx".to_string(),
            )),
        }
    }
}

impl fmt::Display for WorkbookFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_detection() {
        assert_eq!(
            WorkbookFormat::from_path(Path::new("out/report.XLSX")).unwrap(),
            WorkbookFormat::Xlsx
        );
        assert_eq!(
            WorkbookFormat::from_path(Path::new("legacy.xls")).unwrap(),
            WorkbookFormat::Xls
        );
        assert!(matches!(
            WorkbookFormat::from_path(Path::new("report.pdf")),
            Err(SheetMapError::UnsupportedFormat(_))
        ));
        assert!(WorkbookFormat::from_path(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_only_xlsx_is_writable() {
        assert!(WorkbookFormat::Xlsx.ensure_writable().is_ok());
        assert!(WorkbookFormat::Xls.ensure_writable().is_err());
        assert_eq!(WorkbookFormat::Xls.to_string(), ".xls");
    }
}
