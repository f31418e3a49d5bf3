//! Mapping engine: index resolution, serialization and deserialization

pub mod deserialize;
pub mod format;
pub mod formula;
pub mod index;
pub mod serialize;

pub use deserialize::{cell_to_value, deserialize_sheet};
pub use index::{resolve_export_columns, resolve_import_columns, ResolvedColumn};
pub use serialize::{merge_runs, page_sheet_name, serialize_records};
