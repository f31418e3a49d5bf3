//! Per-record-type model configuration

use crate::config::column::{bind_getter, bind_setter, ColumnConfig};
use crate::core::index::resolve_export_columns;
use crate::error::{SheetMapError, SheetMapResult};
use crate::types::FieldValue;

/// One synthesized summary row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsSpec {
    /// Label written in the first cell, e.g. `合计` or `Total`.
    pub name: String,
    /// Aggregate function name, e.g. `SUM`.
    pub formula: String,
    /// Sheet columns receiving the formula.
    pub columns: Vec<u16>,
}

/// Auto-filter region. `last_row == None` means "end of written data".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    pub first_row: u32,
    pub first_col: u16,
    pub last_col: u16,
    pub last_row: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FreezeSpec {
    pub col_split: u16,
    pub row_split: u32,
    pub left_most_column: u16,
    pub top_row: u32,
}

/// Columns plus sheet-level extras for record type `T`.
///
/// Columns keep insertion order; the emitted order is decided by index
/// resolution at serialization time.
#[derive(Debug)]
pub struct ModelConfig<T> {
    columns: Vec<ColumnConfig<T>>,
    statistics: Vec<StatisticsSpec>,
    filters: Vec<FilterSpec>,
    freezes: Vec<FreezeSpec>,
}

impl<T> Default for ModelConfig<T> {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            statistics: Vec::new(),
            filters: Vec::new(),
            freezes: Vec::new(),
        }
    }
}

impl<T> ModelConfig<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field() == Some(field))
    }

    pub(crate) fn field_entry(&mut self, field: &str) -> SheetMapResult<&mut ColumnConfig<T>> {
        if field.trim().is_empty() {
            return Err(SheetMapError::Argument(
                "Field name must not be empty".to_string(),
            ));
        }
        let pos = match self.position(field) {
            Some(pos) => pos,
            None => {
                self.columns
                    .push(ColumnConfig::new(Some(field.to_string()), field));
                self.columns.len() - 1
            }
        };
        Ok(&mut self.columns[pos])
    }

    /// Config for field `name`, created on first request.
    ///
    /// Asking again for the same field returns the same config; accessors
    /// are attached only if the existing config has none yet.
    pub fn property<V, G, S>(
        &mut self,
        name: &str,
        get: G,
        set: S,
    ) -> SheetMapResult<&mut ColumnConfig<T>>
    where
        V: FieldValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let column = self.field_entry(name)?;
        column.bind(Some(bind_getter(get)), Some(bind_setter(set)));
        Ok(column)
    }

    /// Export-only column computed from the whole record.
    pub fn column<V, G>(&mut self, title: impl Into<String>, get: G) -> &mut ColumnConfig<T>
    where
        V: FieldValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        let mut column = ColumnConfig::new(None, title);
        column.bind(Some(bind_getter(get)), None);
        column.with_ignored(false, true);
        self.columns.push(column);
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    pub fn property_config(&self, name: &str) -> Option<&ColumnConfig<T>> {
        self.position(name).map(|pos| &self.columns[pos])
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut ColumnConfig<T>> {
        self.position(name).map(move |pos| &mut self.columns[pos])
    }

    /// Exclude fields on both sides, creating placeholders for unknown names.
    pub fn ignore_properties(&mut self, names: &[&str]) -> SheetMapResult<&mut Self> {
        for name in names {
            self.field_entry(name)?.with_ignored(true, true);
        }
        Ok(self)
    }

    /// Append a summary row: `name` in column 0 and `FORMULA(range)` in each
    /// of `columns`.
    pub fn with_statistics(
        &mut self,
        name: impl Into<String>,
        formula: impl Into<String>,
        columns: &[u16],
    ) -> &mut Self {
        self.statistics.push(StatisticsSpec {
            name: name.into(),
            formula: formula.into(),
            columns: columns.to_vec(),
        });
        self
    }

    pub fn with_filter(
        &mut self,
        first_row: u32,
        first_col: u16,
        last_col: u16,
        last_row: Option<u32>,
    ) -> &mut Self {
        self.filters.push(FilterSpec {
            first_row,
            first_col,
            last_col,
            last_row,
        });
        self
    }

    pub fn with_freeze(
        &mut self,
        col_split: u16,
        row_split: u32,
        left_most_column: u16,
        top_row: u32,
    ) -> &mut Self {
        self.freezes.push(FreezeSpec {
            col_split,
            row_split,
            left_most_column,
            top_row,
        });
        self
    }

    /// Bake the export-side auto-index assignment into explicit indices.
    pub fn adjust_auto_index(&mut self) -> SheetMapResult<&mut Self> {
        let assigned: Vec<(usize, u16)> = resolve_export_columns(self)?
            .iter()
            .map(|resolved| (resolved.position, resolved.index))
            .collect();
        for (position, index) in assigned {
            if let Some(column) = self.columns.get_mut(position) {
                if column.is_auto_index() {
                    column.with_index(index);
                }
            }
        }
        Ok(self)
    }

    pub fn columns(&self) -> &[ColumnConfig<T>] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [ColumnConfig<T>] {
        &mut self.columns
    }

    pub fn statistics(&self) -> &[StatisticsSpec] {
        &self.statistics
    }

    pub fn filters(&self) -> &[FilterSpec] {
        &self.filters
    }

    pub fn freezes(&self) -> &[FreezeSpec] {
        &self.freezes
    }
}
