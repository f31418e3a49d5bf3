//! Column index resolution
//!
//! Export: explicit indices are taken as-is, auto-index columns fill the
//! free slots in ascending order, and the result is sorted by index to give
//! the emission order. Import: explicit (or previously cached) indices win,
//! auto-index columns are located by a case-insensitive header title match.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::{ColumnConfig, ModelConfig};
use crate::error::{SheetMapError, SheetMapResult};

/// A column chosen for one export, with its final index.
#[derive(Debug)]
pub struct ResolvedColumn<'a, T> {
    /// Position in [`ModelConfig::columns`].
    pub position: usize,
    pub index: u16,
    pub config: &'a ColumnConfig<T>,
}

fn unresolved<T>(column: &ColumnConfig<T>) -> SheetMapError {
    SheetMapError::Configuration(format!(
        "No index for {}: set an explicit index or enable auto-index",
        column.describe()
    ))
}

/// Resolve the non-export-ignored columns of `model`, sorted by final index.
///
/// Does not mutate the configuration; two calls give the same mapping.
pub fn resolve_export_columns<T>(
    model: &ModelConfig<T>,
) -> SheetMapResult<Vec<ResolvedColumn<'_, T>>> {
    let emitted: Vec<(usize, &ColumnConfig<T>)> = model
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_export_ignored())
        .collect();

    let taken: BTreeSet<u16> = emitted
        .iter()
        .filter(|(_, c)| !c.is_auto_index())
        .filter_map(|(_, c)| c.index())
        .collect();

    let mut next_free = 0u16;
    let mut resolved = Vec::with_capacity(emitted.len());
    for (position, config) in emitted {
        let index = if config.is_auto_index() {
            while taken.contains(&next_free) {
                next_free += 1;
            }
            let slot = next_free;
            next_free += 1;
            slot
        } else {
            config.index().ok_or_else(|| unresolved(config))?
        };
        resolved.push(ResolvedColumn {
            position,
            index,
            config,
        });
    }

    resolved.sort_by_key(|r| r.index);
    Ok(resolved)
}

/// Resolve the reading column of every importable column.
///
/// Returns `(position, index)` pairs. Indices discovered through the header
/// are cached into the column config so later sheets skip the scan.
pub fn resolve_import_columns<T>(
    model: &mut ModelConfig<T>,
    header: &[(u16, String)],
) -> SheetMapResult<Vec<(usize, u16)>> {
    let mut resolved = Vec::new();
    for (position, column) in model.columns_mut().iter_mut().enumerate() {
        if column.is_import_ignored() || !column.is_writable() {
            continue;
        }

        let index = match column.index() {
            Some(index) => index,
            None if column.is_auto_index() && !column.title().is_empty() => {
                let wanted = column.title().to_lowercase();
                let found = header
                    .iter()
                    .find(|(_, title)| title.to_lowercase() == wanted)
                    .map(|(col, _)| *col)
                    .ok_or_else(|| unresolved(column))?;
                debug!(title = column.title(), index = found, "discovered column by header title");
                column.cache_index(found);
                found
            }
            None => return Err(unresolved(column)),
        };
        resolved.push((position, index));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Row {
        a: String,
        b: String,
        c: String,
    }

    fn abc() -> ModelConfig<Row> {
        let mut config = ModelConfig::<Row>::new();
        config
            .property("a", |r: &Row| r.a.clone(), |r: &mut Row, v| r.a = v)
            .unwrap()
            .with_index(1);
        config
            .property("b", |r: &Row| r.b.clone(), |r: &mut Row, v| r.b = v)
            .unwrap()
            .with_auto_index();
        config
            .property("c", |r: &Row| r.c.clone(), |r: &mut Row, v| r.c = v)
            .unwrap()
            .with_auto_index();
        config
    }

    fn mapping(config: &ModelConfig<Row>) -> Vec<(String, u16)> {
        resolve_export_columns(config)
            .unwrap()
            .iter()
            .map(|r| (r.config.title().to_string(), r.index))
            .collect()
    }

    #[test]
    fn test_auto_index_fills_free_slots() {
        let config = abc();
        assert_eq!(
            mapping(&config),
            vec![("b".to_string(), 0), ("a".to_string(), 1), ("c".to_string(), 2)]
        );
    }

    #[test]
    fn test_export_resolution_is_deterministic_and_pure() {
        let config = abc();
        assert_eq!(mapping(&config), mapping(&config));
        assert_eq!(config.property_config("b").unwrap().index(), None);
    }

    #[test]
    fn test_ignored_columns_do_not_claim_slots() {
        let mut config = abc();
        config.property_mut("a").unwrap().with_ignored(true, false);
        assert_eq!(
            mapping(&config),
            vec![("b".to_string(), 0), ("c".to_string(), 1)]
        );
    }

    #[test]
    fn test_unresolved_column_is_a_configuration_error() {
        let mut config = ModelConfig::<Row>::new();
        config.property("a", |r: &Row| r.a.clone(), |r: &mut Row, v| r.a = v).unwrap();
        let err = resolve_export_columns(&config).unwrap_err();
        assert!(matches!(err, SheetMapError::Configuration(msg) if msg.contains("'a'")));
    }

    #[test]
    fn test_import_discovers_and_caches_by_title() {
        let mut config = abc();
        config.property_mut("b").unwrap().with_title("Beta");
        let header = vec![(0, "alpha".to_string()), (3, "BETA".to_string()), (4, "c".to_string())];

        let resolved = resolve_import_columns(&mut config, &header).unwrap();
        assert_eq!(resolved, vec![(0, 1), (1, 3), (2, 4)]);

        let b = config.property_config("b").unwrap();
        assert_eq!(b.index(), Some(3));
        assert!(b.is_auto_index());
    }

    #[test]
    fn test_import_fails_when_title_is_missing() {
        let mut config = abc();
        let header = vec![(0, "b".to_string())];
        assert!(matches!(
            resolve_import_columns(&mut config, &header),
            Err(SheetMapError::Configuration(_))
        ));
    }
}
