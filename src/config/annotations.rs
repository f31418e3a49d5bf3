//! Declarative field metadata and derivation of a [`ModelConfig`] from it

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::column::{bind_getter, bind_setter, Getter, Setter};
use crate::config::model::ModelConfig;
use crate::error::{SheetMapError, SheetMapResult};
use crate::types::FieldValue;

/// Display metadata for one record field plus its accessor pair.
pub struct FieldAnnotation<T> {
    name: String,
    getter: Getter<T>,
    setter: Setter<T>,
    display_name: Option<String>,
    order: Option<u16>,
    display_format: Option<String>,
}

impl<T> FieldAnnotation<T> {
    pub fn new<V, G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        V: FieldValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            getter: bind_getter(get),
            setter: bind_setter(set),
            display_name: None,
            order: None,
            display_format: None,
        }
    }

    /// Column title; the field name is used when absent.
    pub fn display(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Explicit column position.
    pub fn order(mut self, order: u16) -> Self {
        self.order = Some(order);
        self
    }

    /// Display format, bare (`0.00`) or wrapped as `{0:0.00}`.
    pub fn display_format(mut self, format: impl Into<String>) -> Self {
        self.display_format = Some(format.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn overlay(&mut self, entry: &FieldMetadata) {
        if let Some(display_name) = &entry.display_name {
            self.display_name = Some(display_name.clone());
        }
        if let Some(order) = entry.order {
            self.order = Some(order);
        }
        if let Some(format) = &entry.display_format {
            self.display_format = Some(format.clone());
        }
    }
}

/// Record types that describe their own fields.
pub trait Annotated: Sized + 'static {
    /// Fields in declaration order.
    fn annotations() -> Vec<FieldAnnotation<Self>>;
}

/// `{0:yyyy-MM-dd}` → `yyyy-MM-dd`
fn unwrap_display_format(format: &str) -> String {
    format.replace("{0:", "").replace('}', "")
}

impl<T> ModelConfig<T> {
    /// Build one column per annotation.
    ///
    /// Title comes from the display name (else the field name), the
    /// formatter from the display format, and the index from the order;
    /// fields without an order get auto-index.
    pub fn from_field_annotations(
        annotations: Vec<FieldAnnotation<T>>,
    ) -> SheetMapResult<Self> {
        let mut config = ModelConfig::new();
        for annotation in annotations {
            let FieldAnnotation {
                name,
                getter,
                setter,
                display_name,
                order,
                display_format,
            } = annotation;

            let column = config.field_entry(&name)?;
            column.bind(Some(getter), Some(setter));
            column.with_title(display_name.unwrap_or_else(|| name.clone()));
            if let Some(format) = display_format {
                column.with_formatter(unwrap_display_format(&format));
            }
            match order {
                Some(order) => column.with_index(order),
                None => column.with_auto_index(),
            };
        }
        Ok(config)
    }

    /// [`ModelConfig::from_field_annotations`] over `T::annotations()`.
    pub fn from_annotations() -> SheetMapResult<Self>
    where
        T: Annotated,
    {
        Self::from_field_annotations(T::annotations())
    }

    /// Like [`ModelConfig::from_annotations`], with `table` entries
    /// overriding the compiled-in metadata per field name.
    pub fn from_annotations_with(table: &MetadataTable) -> SheetMapResult<Self>
    where
        T: Annotated,
    {
        let mut annotations = T::annotations();
        for entry in &table.fields {
            let annotation = annotations
                .iter_mut()
                .find(|a| a.name == entry.field)
                .ok_or_else(|| {
                    SheetMapError::Configuration(format!(
                        "Metadata names unknown field '{}' of {}",
                        entry.field,
                        std::any::type_name::<T>()
                    ))
                })?;
            annotation.overlay(entry);
        }
        Self::from_field_annotations(annotations)
    }
}

/// Metadata overrides for one field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldMetadata {
    pub field: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub order: Option<u16>,
    #[serde(default)]
    pub display_format: Option<String>,
}

/// YAML document of field metadata.
///
/// ```yaml
/// fields:
///   - field: amount
///     display_name: Amount
///     order: 2
///     display_format: "{0:0.00}"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetadataTable {
    #[serde(default)]
    pub fields: Vec<FieldMetadata>,
}

impl MetadataTable {
    pub fn from_yaml(content: &str) -> SheetMapResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> SheetMapResult<Self> {
        if !path.exists() {
            return Err(SheetMapError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[derive(Debug, Default)]
    struct Invoice {
        number: String,
        issued: Option<NaiveDate>,
        total: f64,
    }

    impl Annotated for Invoice {
        fn annotations() -> Vec<FieldAnnotation<Self>> {
            vec![
                FieldAnnotation::new("number", |r: &Invoice| r.number.clone(), |r: &mut Invoice, v| r.number = v)
                    .display("Invoice No.")
                    .order(0),
                FieldAnnotation::new("issued", |r: &Invoice| r.issued, |r: &mut Invoice, v| r.issued = v)
                    .display_format("{0:yyyy-MM-dd}"),
                FieldAnnotation::new("total", |r: &Invoice| r.total, |r: &mut Invoice, v| r.total = v),
            ]
        }
    }

    fn summary(config: &ModelConfig<Invoice>) -> Vec<(String, Option<u16>, Option<String>)> {
        config
            .columns()
            .iter()
            .map(|c| (c.title().to_string(), c.index(), c.formatter().map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_derivation_applies_metadata() {
        let config = ModelConfig::<Invoice>::from_annotations().unwrap();
        assert_eq!(
            summary(&config),
            vec![
                ("Invoice No.".to_string(), Some(0), None),
                ("issued".to_string(), None, Some("yyyy-MM-dd".to_string())),
                ("total".to_string(), None, None),
            ]
        );
        assert!(config.property_config("issued").unwrap().is_auto_index());
        assert!(!config.property_config("number").unwrap().is_auto_index());
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let first = ModelConfig::<Invoice>::from_annotations().unwrap();
        let second = ModelConfig::<Invoice>::from_annotations().unwrap();
        assert_eq!(summary(&first), summary(&second));
    }

    #[test]
    fn test_metadata_table_overrides_annotations() {
        let table = MetadataTable::from_yaml(
            "fields:\n  - field: total\n    display_name: Total\n    order: 5\n    display_format: \"{0:0.00}\"\n",
        )
        .unwrap();
        let config = ModelConfig::<Invoice>::from_annotations_with(&table).unwrap();
        let total = config.property_config("total").unwrap();
        assert_eq!(total.title(), "Total");
        assert_eq!(total.index(), Some(5));
        assert_eq!(total.formatter(), Some("0.00"));
    }

    #[test]
    fn test_metadata_for_unknown_field_is_rejected() {
        let table = MetadataTable::from_yaml("fields:\n  - field: nope\n").unwrap();
        assert!(matches!(
            ModelConfig::<Invoice>::from_annotations_with(&table),
            Err(SheetMapError::Configuration(_))
        ));
    }

    #[test]
    fn test_malformed_metadata_is_reported() {
        assert!(matches!(
            MetadataTable::from_yaml("fields: [1, 2"),
            Err(SheetMapError::Metadata(_))
        ));
    }
}
