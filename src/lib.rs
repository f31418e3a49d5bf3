//! SheetMap - typed records to and from Excel worksheets
//!
//! This library maps collections of Rust records onto spreadsheet rows and
//! back, driven by a per-type column configuration.
//!
//! # Features
//!
//! - Fluent column configuration (index, title, formatter, converter, merge)
//! - Configuration derived from declarative field metadata
//! - Auto-index: free-slot assignment on export, header title match on import
//! - Merged runs, statistics rows, auto-filters and freeze panes
//! - Paging across sheets, `.xlsx` export and `.xls`/`.xlsx` import
//!
//! # Example
//!
//! ```no_run
//! use royalbit_sheetmap::{ConfigStore, ModelConfig, RecordExporter, RecordImporter};
//!
//! #[derive(Debug, Default)]
//! struct Sale {
//!     region: String,
//!     amount: f64,
//! }
//!
//! let mut config = ModelConfig::<Sale>::new();
//! config
//!     .property("region", |s: &Sale| s.region.clone(), |s: &mut Sale, v| s.region = v)?
//!     .with_index(0)
//!     .with_title("Region")
//!     .with_merge(true);
//! config
//!     .property("amount", |s: &Sale| s.amount, |s: &mut Sale, v| s.amount = v)?
//!     .with_index(1)
//!     .with_title("Amount");
//! config.with_statistics("Total", "SUM", &[1]);
//!
//! let mut store = ConfigStore::new();
//! store.register(config);
//!
//! let sales = vec![Sale { region: "north".into(), amount: 12.5 }];
//! RecordExporter::new(&store).export(&sales, "sales.xlsx")?;
//!
//! let loaded: Vec<Sale> = RecordImporter::new(&mut store).load("sales.xlsx")?;
//! println!("Loaded {} sales", loaded.len());
//! # Ok::<(), royalbit_sheetmap::SheetMapError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod sheet;
pub mod types;

// Re-export commonly used types
pub use config::{
    Annotated, ColumnConfig, ConfigStore, ExportOptions, FieldAnnotation, FormulaValues,
    ImportOptions, MetadataTable, ModelConfig, WorkbookProperties,
};
pub use error::{SheetMapError, SheetMapResult};
pub use excel::{
    export_annotated, load_annotated, RecordExporter, RecordImporter, WorkbookBuilder,
    WorkbookFormat,
};
pub use sheet::{MemoryWorkbook, Sheet, Workbook};
pub use types::{CellValue, FieldValue, Value};
