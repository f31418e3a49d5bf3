//! Spreadsheet file entry points
//!
//! - Export: records → `.xlsx` file or bytes, appending to an existing file
//! - Import: `.xls`/`.xlsx` file or bytes → records

mod builder;
mod exporter;
mod format;
mod importer;

pub use builder::WorkbookBuilder;
pub use exporter::WorkbookEncoder;
pub use format::WorkbookFormat;
pub use importer::WorkbookDecoder;

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::config::{
    with_global, Annotated, ConfigStore, ExportOptions, ImportOptions, WorkbookProperties,
};
use crate::core::{deserialize_sheet, serialize_records};
use crate::error::{SheetMapError, SheetMapResult};
use crate::sheet::{MemoryWorkbook, Workbook};

/// Writes record collections using the configurations in a [`ConfigStore`].
#[derive(Debug)]
pub struct RecordExporter<'s> {
    store: &'s ConfigStore,
    options: ExportOptions,
    properties: WorkbookProperties,
}

impl<'s> RecordExporter<'s> {
    pub fn new(store: &'s ConfigStore) -> Self {
        Self {
            store,
            options: ExportOptions::default(),
            properties: WorkbookProperties::default(),
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_properties(mut self, properties: WorkbookProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Serialize into an existing in-memory workbook.
    pub fn export_into<'a, T, I, R, W>(&self, workbook: &mut W, records: I) -> SheetMapResult<Vec<String>>
    where
        T: 'static,
        I: IntoIterator<Item = R>,
        R: Into<Option<&'a T>>,
        W: Workbook,
    {
        let config = self.store.require::<T>()?;
        serialize_records(workbook, records, config, &self.options)
    }

    /// Write `records` to `path`. An existing file is loaded first and its
    /// sheets are kept with their values, formulas and merged regions; their
    /// styles, freeze panes, filters and column widths are not carried over.
    ///
    /// Only `.xlsx` can be written. A `.xls` path fails with
    /// [`SheetMapError::UnsupportedFormat`]; `.xls` files can still be read
    /// with [`RecordImporter::load`].
    pub fn export<'a, T, I, R>(&self, records: I, path: impl AsRef<Path>) -> SheetMapResult<Vec<String>>
    where
        T: 'static,
        I: IntoIterator<Item = R>,
        R: Into<Option<&'a T>>,
    {
        let path = path.as_ref();
        WorkbookFormat::from_path(path)?.ensure_writable()?;

        let mut workbook = self.open_target(path)?;
        let sheets = self.export_into(&mut workbook, records)?;
        WorkbookEncoder::new(&workbook).save(path)?;
        debug!(path = %path.display(), sheets = sheets.len(), "exported workbook");
        Ok(sheets)
    }

    /// Encode `records` into a fresh `.xlsx` buffer.
    pub fn export_to_bytes<'a, T, I, R>(&self, records: I) -> SheetMapResult<Vec<u8>>
    where
        T: 'static,
        I: IntoIterator<Item = R>,
        R: Into<Option<&'a T>>,
    {
        let mut workbook = self.new_workbook();
        self.export_into(&mut workbook, records)?;
        WorkbookEncoder::new(&workbook).to_bytes()
    }

    /// Write one sheet (plus pages) per distinct `selector` key, in order of
    /// first appearance.
    pub fn export_grouped<'a, T, I, F, K>(
        &self,
        records: I,
        path: impl AsRef<Path>,
        selector: F,
    ) -> SheetMapResult<Vec<String>>
    where
        T: 'static,
        I: IntoIterator<Item = &'a T>,
        F: Fn(&T) -> K,
        K: Into<String>,
    {
        let path = path.as_ref();
        WorkbookFormat::from_path(path)?.ensure_writable()?;
        let config = self.store.require::<T>()?;

        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&'a T>> = HashMap::new();
        for record in records {
            let key: String = selector(record).into();
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(record);
        }

        let mut workbook = self.open_target(path)?;
        let mut sheets = Vec::new();
        for key in order {
            let options = self.options.clone().with_sheet_name(key.clone());
            let group = groups.remove(&key).unwrap_or_default();
            sheets.extend(serialize_records(&mut workbook, group, config, &options)?);
        }
        WorkbookEncoder::new(&workbook).save(path)?;
        Ok(sheets)
    }

    fn new_workbook(&self) -> MemoryWorkbook {
        let mut workbook = MemoryWorkbook::new();
        workbook.set_properties(self.properties.clone());
        workbook
    }

    fn open_target(&self, path: &Path) -> SheetMapResult<MemoryWorkbook> {
        if !path.exists() {
            return Ok(self.new_workbook());
        }
        let mut workbook = WorkbookDecoder::read_path(path)?;
        if !self.properties.is_empty() {
            workbook.set_properties(self.properties.clone());
        }
        Ok(workbook)
    }
}

/// Reads records using the configurations in a [`ConfigStore`].
///
/// Holds the store mutably: indices discovered from header titles are cached
/// into the stored configuration.
#[derive(Debug)]
pub struct RecordImporter<'s> {
    store: &'s mut ConfigStore,
    options: ImportOptions,
}

impl<'s> RecordImporter<'s> {
    pub fn new(store: &'s mut ConfigStore) -> Self {
        Self {
            store,
            options: ImportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Read records from `options.sheet_index` of an in-memory workbook.
    pub fn load_from<T, W>(&mut self, workbook: &W) -> SheetMapResult<Vec<T>>
    where
        T: Default + 'static,
        W: Workbook,
    {
        let config = self.store.require_mut::<T>()?;
        let sheet = workbook.sheet_at(self.options.sheet_index).ok_or_else(|| {
            SheetMapError::Argument(format!(
                "Sheet index {} is out of range ({} sheets)",
                self.options.sheet_index,
                workbook.sheet_names().len()
            ))
        })?;
        deserialize_sheet(sheet, config, &self.options)
    }

    /// Read records from an `.xls`/`.xlsx` file.
    pub fn load<T>(&mut self, path: impl AsRef<Path>) -> SheetMapResult<Vec<T>>
    where
        T: Default + 'static,
    {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SheetMapError::NotFound(path.to_path_buf()));
        }
        WorkbookFormat::from_path(path)?;
        let workbook = WorkbookDecoder::read_path(path)?;
        self.load_from(&workbook)
    }

    /// Read records from file content; the container format is sniffed.
    pub fn load_bytes<T>(&mut self, bytes: Vec<u8>) -> SheetMapResult<Vec<T>>
    where
        T: Default + 'static,
    {
        let workbook = WorkbookDecoder::read_bytes(bytes)?;
        self.load_from(&workbook)
    }
}

/// Export with the process-wide store, deriving `T`'s configuration from its
/// annotations on first use.
pub fn export_annotated<'a, T, I, R>(
    records: I,
    path: impl AsRef<Path>,
    options: ExportOptions,
) -> SheetMapResult<Vec<String>>
where
    T: Annotated,
    I: IntoIterator<Item = R>,
    R: Into<Option<&'a T>>,
{
    with_global(|store| {
        store.for_type::<T>()?;
        RecordExporter::new(store)
            .with_options(options)
            .export(records, path)
    })
}

/// Import with the process-wide store; see [`export_annotated`].
pub fn load_annotated<T>(path: impl AsRef<Path>, options: ImportOptions) -> SheetMapResult<Vec<T>>
where
    T: Annotated + Default,
{
    with_global(|store| {
        store.for_type::<T>()?;
        RecordImporter::new(store).with_options(options).load(path)
    })
}
