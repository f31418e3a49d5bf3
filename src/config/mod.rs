//! Column and model configuration
//!
//! A [`ModelConfig`] is built either fluently (`property`, `column`,
//! `with_statistics`, ...) or derived from [`Annotated`] field metadata, and
//! kept per record type in a [`ConfigStore`].

mod annotations;
mod column;
mod model;
mod options;
mod store;

pub use annotations::{Annotated, FieldAnnotation, FieldMetadata, MetadataTable};
pub use column::{ColumnConfig, Getter, Setter, ValueConverter};
pub use model::{FilterSpec, FreezeSpec, ModelConfig, StatisticsSpec};
pub use options::{
    ExportOptions, FormulaValues, ImportOptions, WorkbookProperties, DEFAULT_SHEET_NAME,
};
pub use store::{with_global, ConfigStore};
