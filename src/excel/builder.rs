//! Workbook holding sheets of different record types

use std::path::Path;

use crate::config::{ExportOptions, ModelConfig, WorkbookProperties};
use crate::core::serialize_records;
use crate::error::SheetMapResult;
use crate::excel::{WorkbookEncoder, WorkbookFormat};
use crate::sheet::MemoryWorkbook;

type SheetWriter = Box<dyn FnOnce(&mut MemoryWorkbook, &ExportOptions) -> SheetMapResult<Vec<String>>>;

/// Queue sheets of heterogeneous records, then write them in one workbook.
///
/// ```no_run
/// use royalbit_sheetmap::{ModelConfig, WorkbookBuilder};
///
/// #[derive(Default)]
/// struct City { name: String }
///
/// let mut cities = ModelConfig::<City>::new();
/// cities
///     .property("name", |c: &City| c.name.clone(), |c: &mut City, v| c.name = v)?
///     .with_index(0);
///
/// WorkbookBuilder::new()
///     .with_worksheet("Cities", vec![City { name: "Oslo".into() }], cities)
///     .save("cities.xlsx")?;
/// # Ok::<(), royalbit_sheetmap::SheetMapError>(())
/// ```
#[derive(Default)]
pub struct WorkbookBuilder {
    sheets: Vec<(String, SheetWriter)>,
    max_rows_per_sheet: Option<usize>,
    properties: WorkbookProperties,
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet. A name already queued gets a numeric suffix
    /// (`Orders`, `Orders1`, `Orders2`); an empty name uses the type name.
    pub fn with_worksheet<T: 'static>(
        mut self,
        name: &str,
        records: Vec<T>,
        config: ModelConfig<T>,
    ) -> Self {
        let base = if name.trim().is_empty() {
            short_type_name::<T>().to_string()
        } else {
            name.to_string()
        };
        let name = self.unique_name(&base);
        let writer: SheetWriter = Box::new(move |workbook, options| {
            serialize_records(workbook, &records, &config, options)
        });
        self.sheets.push((name, writer));
        self
    }

    pub fn with_max_rows_per_sheet(mut self, max_rows: usize) -> Self {
        self.max_rows_per_sheet = Some(max_rows);
        self
    }

    pub fn with_properties(mut self, properties: WorkbookProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Queued sheet names in write order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn unique_name(&self, base: &str) -> String {
        let taken = |candidate: &str| {
            self.sheets
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(candidate))
        };
        let mut candidate = base.to_string();
        let mut suffix = 0;
        while taken(&candidate) {
            suffix += 1;
            candidate = format!("{}{}", base, suffix);
        }
        candidate
    }

    /// Serialize every queued sheet into a fresh in-memory workbook.
    pub fn build(self) -> SheetMapResult<MemoryWorkbook> {
        let mut workbook = MemoryWorkbook::new();
        workbook.set_properties(self.properties);
        for (name, writer) in self.sheets {
            let mut options = ExportOptions::default().with_sheet_name(name);
            if let Some(max_rows) = self.max_rows_per_sheet {
                options = options.with_max_rows_per_sheet(max_rows);
            }
            writer(&mut workbook, &options)?;
        }
        Ok(workbook)
    }

    pub fn save(self, path: impl AsRef<Path>) -> SheetMapResult<()> {
        let path = path.as_ref();
        WorkbookFormat::from_path(path)?.ensure_writable()?;
        let workbook = self.build()?;
        WorkbookEncoder::new(&workbook).save(path)
    }

    pub fn to_bytes(self) -> SheetMapResult<Vec<u8>> {
        let workbook = self.build()?;
        WorkbookEncoder::new(&workbook).to_bytes()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::Workbook;

    #[derive(Debug, Default)]
    struct Tag {
        label: String,
    }

    fn tags() -> ModelConfig<Tag> {
        let mut config = ModelConfig::<Tag>::new();
        config
            .property("label", |t: &Tag| t.label.clone(), |t: &mut Tag, v| t.label = v)
            .unwrap()
            .with_index(0);
        config
    }

    fn tag(label: &str) -> Tag {
        Tag {
            label: label.to_string(),
        }
    }

    #[test]
    fn test_duplicate_names_get_suffixes() {
        let builder = WorkbookBuilder::new()
            .with_worksheet("Tags", vec![tag("a")], tags())
            .with_worksheet("Tags", vec![tag("b")], tags())
            .with_worksheet("tags", vec![tag("c")], tags())
            .with_worksheet("", vec![tag("d")], tags());
        assert_eq!(builder.sheet_names(), vec!["Tags", "Tags1", "tags2", "Tag"]);

        let workbook = builder.build().unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Tags", "Tags1", "tags2", "Tag"]);
    }

    #[test]
    fn test_builder_pages_large_sheets() {
        let workbook = WorkbookBuilder::new()
            .with_max_rows_per_sheet(1)
            .with_worksheet("Tags", vec![tag("a"), tag("b")], tags())
            .build()
            .unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Tags", "Tags_1"]);
    }
}
