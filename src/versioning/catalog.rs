//! Change catalog: id → change unit, and registry assembly from config.
//!
//! # Data Flow
//! ```text
//! [[changes]]  → ChangeCatalog (built-in kinds + programmatic units)
//! [[versions]] → look up each change id in the catalog
//!              → VersionRegistry::new (eager validation)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::schema::{ChangeConfig, TransformConfig, VersionConfig};
use crate::versioning::builtin::{ChangeMeta, DefaultValue, HideField, RenameField};
use crate::versioning::change::Change;
use crate::versioning::registry::{RegistryError, Version, VersionRegistry};

#[derive(Debug, Default, Clone)]
pub struct ChangeCatalog {
    changes: HashMap<String, Arc<dyn Change>>,
}

impl ChangeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from declarative change configs.
    pub fn from_configs(configs: &[ChangeConfig]) -> Result<Self, RegistryError> {
        let mut catalog = Self::new();
        catalog.register_configs(configs)?;
        Ok(catalog)
    }

    /// Add declarative changes next to the ones already registered.
    pub fn register_configs(&mut self, configs: &[ChangeConfig]) -> Result<(), RegistryError> {
        for (index, config) in configs.iter().enumerate() {
            if config.id.trim().is_empty() {
                return Err(RegistryError::EmptyChangeId { index });
            }
            self.register(build_change(config))?;
        }
        Ok(())
    }

    /// Add a change unit. Ids must be unique.
    pub fn register(&mut self, change: Arc<dyn Change>) -> Result<(), RegistryError> {
        let id = change.id().to_string();
        if self.changes.contains_key(&id) {
            return Err(RegistryError::DuplicateChange(id));
        }
        self.changes.insert(id, change);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Change>> {
        self.changes.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Assemble the registry, resolving every change reference.
    pub fn build_registry(&self, versions: &[VersionConfig]) -> Result<VersionRegistry, RegistryError> {
        let versions = versions
            .iter()
            .map(|version| {
                let changes = version
                    .changes
                    .iter()
                    .map(|id| {
                        self.get(id).ok_or_else(|| RegistryError::UnknownChange {
                            version: version.name.clone(),
                            change: id.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Version::new(version.name.clone(), changes))
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;

        VersionRegistry::new(versions)
    }
}

fn build_change(config: &ChangeConfig) -> Arc<dyn Change> {
    let meta = ChangeMeta::new(config.id.clone(), config.routes.clone()).describe(config.description.clone());

    match &config.transform {
        TransformConfig::RenameField {
            location,
            legacy,
            current,
        } => Arc::new(RenameField::new(meta, *location, legacy.clone(), current.clone())),
        TransformConfig::DefaultValue {
            location,
            field,
            value,
        } => Arc::new(DefaultValue::new(meta, *location, field.clone(), value.clone())),
        TransformConfig::HideField { field } => Arc::new(HideField::new(meta, field.clone())),
    }
}
