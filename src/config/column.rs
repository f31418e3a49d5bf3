//! Per-column configuration

use std::fmt;

use crate::error::SheetMapResult;
use crate::types::{FieldValue, Value};

/// Reads one column value out of a record.
pub type Getter<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
/// Writes one coerced column value into a record.
pub type Setter<T> = Box<dyn Fn(&mut T, Value) -> SheetMapResult<()> + Send + Sync>;
/// Rewrites a value on its way into or out of the sheet.
pub type ValueConverter = Box<dyn Fn(Value) -> Value + Send + Sync>;

pub(crate) fn bind_getter<T, V, G>(get: G) -> Getter<T>
where
    V: FieldValue,
    G: Fn(&T) -> V + Send + Sync + 'static,
{
    Box::new(move |record| get(record).to_value())
}

pub(crate) fn bind_setter<T, V, S>(set: S) -> Setter<T>
where
    V: FieldValue,
    S: Fn(&mut T, V) + Send + Sync + 'static,
{
    Box::new(move |record, value| {
        set(record, V::from_value(value)?);
        Ok(())
    })
}

/// Binding of one record field (or computed accessor) to one sheet column.
pub struct ColumnConfig<T> {
    field: Option<String>,
    getter: Option<Getter<T>>,
    setter: Option<Setter<T>>,
    title: String,
    index: Option<u16>,
    auto_index: bool,
    allow_merge: bool,
    export_ignored: bool,
    import_ignored: bool,
    formatter: Option<String>,
    converter: Option<ValueConverter>,
}

impl<T> ColumnConfig<T> {
    pub(crate) fn new(field: Option<String>, title: impl Into<String>) -> Self {
        Self {
            field,
            getter: None,
            setter: None,
            title: title.into(),
            index: None,
            auto_index: false,
            allow_merge: false,
            export_ignored: false,
            import_ignored: false,
            formatter: None,
            converter: None,
        }
    }

    pub(crate) fn bind(&mut self, getter: Option<Getter<T>>, setter: Option<Setter<T>>) {
        if self.getter.is_none() {
            self.getter = getter;
        }
        if self.setter.is_none() {
            self.setter = setter;
        }
    }

    /// Set an explicit column index; clears auto-index.
    pub fn with_index(&mut self, index: u16) -> &mut Self {
        self.index = Some(index);
        self.auto_index = false;
        self
    }

    /// Resolve the index automatically: first free slot on export, header
    /// title match on import. Clears any explicit index.
    pub fn with_auto_index(&mut self) -> &mut Self {
        self.auto_index = true;
        self.index = None;
        self
    }

    pub fn with_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = title.into();
        self
    }

    /// Number/date display format, e.g. `yyyy-MM-dd` or `0.00`.
    pub fn with_formatter(&mut self, formatter: impl Into<String>) -> &mut Self {
        self.formatter = Some(formatter.into());
        self
    }

    /// Converter applied to every exported and imported value, including
    /// empty ones.
    pub fn with_value_converter<F>(&mut self, converter: F) -> &mut Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.converter = Some(Box::new(converter));
        self
    }

    pub fn with_merge(&mut self, enabled: bool) -> &mut Self {
        self.allow_merge = enabled;
        self
    }

    pub fn with_ignored(&mut self, export_ignored: bool, import_ignored: bool) -> &mut Self {
        self.export_ignored = export_ignored;
        self.import_ignored = import_ignored;
        self
    }

    /// Configure index, title, formatter, merge and converter in one call.
    pub fn with_excel_cell(
        &mut self,
        index: u16,
        title: impl Into<String>,
        formatter: Option<&str>,
        allow_merge: bool,
        converter: Option<ValueConverter>,
    ) -> &mut Self {
        self.index = Some(index);
        self.auto_index = false;
        self.title = title.into();
        self.formatter = formatter.map(str::to_string);
        self.allow_merge = allow_merge;
        self.converter = converter;
        self
    }

    /// Like [`ColumnConfig::with_excel_cell`], with the index discovered
    /// from `title`.
    pub fn with_auto_index_cell(
        &mut self,
        title: impl Into<String>,
        formatter: Option<&str>,
        allow_merge: bool,
        converter: Option<ValueConverter>,
    ) -> &mut Self {
        self.index = None;
        self.auto_index = true;
        self.title = title.into();
        self.formatter = formatter.map(str::to_string);
        self.allow_merge = allow_merge;
        self.converter = converter;
        self
    }

    /// Keep the column's layout but exclude it on the given sides.
    pub fn ignore_with(
        &mut self,
        index: u16,
        title: impl Into<String>,
        formatter: Option<&str>,
        export_ignored: bool,
        import_ignored: bool,
    ) -> &mut Self {
        self.index = Some(index);
        self.title = title.into();
        self.formatter = formatter.map(str::to_string);
        self.export_ignored = export_ignored;
        self.import_ignored = import_ignored;
        self
    }

    /// Field name for property columns, `None` for computed columns.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Explicit or cached index; `None` while unresolved.
    pub fn index(&self) -> Option<u16> {
        self.index
    }

    pub fn is_auto_index(&self) -> bool {
        self.auto_index
    }

    pub fn allows_merge(&self) -> bool {
        self.allow_merge
    }

    pub fn is_export_ignored(&self) -> bool {
        self.export_ignored
    }

    pub fn is_import_ignored(&self) -> bool {
        self.import_ignored
    }

    pub fn formatter(&self) -> Option<&str> {
        self.formatter.as_deref()
    }

    pub fn has_converter(&self) -> bool {
        self.converter.is_some()
    }

    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Human-readable identity used in error messages.
    pub fn describe(&self) -> String {
        match &self.field {
            Some(field) => format!("field '{}' (title '{}')", field, self.title),
            None => format!("column '{}'", self.title),
        }
    }

    pub(crate) fn cache_index(&mut self, index: u16) {
        self.index = Some(index);
    }

    /// Pass `value` through the converter, if any.
    pub fn convert(&self, value: Value) -> Value {
        match &self.converter {
            Some(converter) => converter(value),
            None => value,
        }
    }

    /// Accessor value followed by the converter.
    pub fn extract(&self, record: &T) -> Value {
        let raw = self
            .getter
            .as_ref()
            .map(|get| get(record))
            .unwrap_or_default();
        self.convert(raw)
    }

    /// Coerce `value` into the field; no-op for computed columns.
    pub fn assign(&self, record: &mut T, value: Value) -> SheetMapResult<()> {
        match &self.setter {
            Some(set) => set(record, value),
            None => Ok(()),
        }
    }
}

impl<T> fmt::Debug for ColumnConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnConfig")
            .field("field", &self.field)
            .field("title", &self.title)
            .field("index", &self.index)
            .field("auto_index", &self.auto_index)
            .field("allow_merge", &self.allow_merge)
            .field("export_ignored", &self.export_ignored)
            .field("import_ignored", &self.import_ignored)
            .field("formatter", &self.formatter)
            .field("converter", &self.converter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Item {
        qty: i32,
    }

    fn qty_column() -> ColumnConfig<Item> {
        let mut column = ColumnConfig::new(Some("qty".to_string()), "qty");
        column.bind(
            Some(bind_getter(|r: &Item| r.qty)),
            Some(bind_setter(|r: &mut Item, v: i32| r.qty = v)),
        );
        column
    }

    #[test]
    fn test_index_and_auto_index_are_exclusive() {
        let mut column = qty_column();
        column.with_index(4);
        assert_eq!(column.index(), Some(4));
        assert!(!column.is_auto_index());

        column.with_auto_index();
        assert_eq!(column.index(), None);
        assert!(column.is_auto_index());

        column.with_index(2);
        assert!(!column.is_auto_index());
    }

    #[test]
    fn test_converter_runs_on_empty_values() {
        let mut column: ColumnConfig<Item> = ColumnConfig::new(None, "computed");
        column.with_value_converter(|v| match v {
            Value::Empty => Value::Text("n/a".to_string()),
            other => other,
        });
        assert_eq!(column.extract(&Item::default()), Value::Text("n/a".into()));
    }

    #[test]
    fn test_extract_and_assign_round_trip() {
        let column = qty_column();
        let mut item = Item { qty: 5 };
        assert_eq!(column.extract(&item), Value::Int(5));
        column.assign(&mut item, Value::Number(9.0)).unwrap();
        assert_eq!(item.qty, 9);
        assert!(column.assign(&mut item, Value::Text("x".into())).is_err());
    }

    #[test]
    fn test_ignore_with_sets_layout_and_flags() {
        let mut column = qty_column();
        column.ignore_with(8, "Area", None, false, true);
        assert_eq!(column.index(), Some(8));
        assert_eq!(column.title(), "Area");
        assert!(!column.is_export_ignored());
        assert!(column.is_import_ignored());
    }
}
