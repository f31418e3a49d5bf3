//! Configuration store keyed by record type
//!
//! [`ConfigStore`] is an explicit value handed to the exporter/importer. A
//! process-wide instance is available through [`with_global`]; it is guarded
//! by a mutex so concurrent first-time derivation cannot race.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::config::annotations::Annotated;
use crate::config::model::ModelConfig;
use crate::error::{SheetMapError, SheetMapResult};

#[derive(Default)]
pub struct ConfigStore {
    configs: HashMap<TypeId, Box<dyn Any + Send>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the configuration for `T`.
    pub fn register<T: 'static>(&mut self, config: ModelConfig<T>) {
        self.configs.insert(TypeId::of::<T>(), Box::new(config));
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.configs.contains_key(&TypeId::of::<T>())
    }

    pub fn get<T: 'static>(&self) -> Option<&ModelConfig<T>> {
        self.configs
            .get(&TypeId::of::<T>())
            .and_then(|config| config.downcast_ref())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut ModelConfig<T>> {
        self.configs
            .get_mut(&TypeId::of::<T>())
            .and_then(|config| config.downcast_mut())
    }

    pub fn require<T: 'static>(&self) -> SheetMapResult<&ModelConfig<T>> {
        self.get().ok_or_else(missing::<T>)
    }

    pub fn require_mut<T: 'static>(&mut self) -> SheetMapResult<&mut ModelConfig<T>> {
        self.get_mut().ok_or_else(missing::<T>)
    }

    /// Configuration for `T`, derived from its annotations on first use.
    pub fn for_type<T: Annotated>(&mut self) -> SheetMapResult<&mut ModelConfig<T>> {
        if !self.contains::<T>() {
            self.register(ModelConfig::<T>::from_annotations()?);
        }
        self.require_mut()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("types", &self.configs.len())
            .finish()
    }
}

fn missing<T>() -> SheetMapError {
    SheetMapError::Configuration(format!(
        "No configuration registered for {}",
        type_name::<T>()
    ))
}

fn global() -> &'static Mutex<ConfigStore> {
    static STORE: OnceLock<Mutex<ConfigStore>> = OnceLock::new();
    STORE.get_or_init(|| Mutex::new(ConfigStore::new()))
}

/// Run `f` with exclusive access to the process-wide store.
pub fn with_global<R>(f: impl FnOnce(&mut ConfigStore) -> R) -> R {
    let mut store = match global().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    f(&mut store)
}
