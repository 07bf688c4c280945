//! Version registry.
//!
//! # Responsibilities
//! - Hold the ordered (oldest → current) list of versions
//! - Reject malformed entries when the registry is built
//!
//! # Design Decisions
//! - Immutable after construction; shared via `Arc` across request tasks
//! - Validation is eager: a registry that exists is well formed
//! - First match on name is authoritative, duplicates are refused outright

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::versioning::change::Change;

/// A registry entry that is not a well-formed version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("registry entry {index} has an empty version name")]
    EmptyName { index: usize },

    #[error("registry entry {index} duplicates version '{name}'")]
    DuplicateName { index: usize, name: String },

    #[error("version '{version}' references unknown change '{change}'")]
    UnknownChange { version: String, change: String },

    #[error("change id '{0}' is declared more than once")]
    DuplicateChange(String),

    #[error("change at position {index} has an empty id")]
    EmptyChangeId { index: usize },

    #[error("version source unavailable: {0}")]
    Unavailable(String),
}

/// A named snapshot of the API contract and the changes that lift it to the next version.
#[derive(Debug, Clone)]
pub struct Version {
    name: String,
    changes: Vec<Arc<dyn Change>>,
}

impl Version {
    pub fn new(name: impl Into<String>, changes: Vec<Arc<dyn Change>>) -> Self {
        Self {
            name: name.into(),
            changes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn changes(&self) -> &[Arc<dyn Change>] {
        &self.changes
    }
}

/// Ordered sequence of versions, oldest first.
#[derive(Debug, Clone, Default)]
pub struct VersionRegistry {
    versions: Vec<Version>,
}

impl VersionRegistry {
    /// Build a registry, failing on the first malformed entry.
    pub fn new(versions: Vec<Version>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for (index, version) in versions.iter().enumerate() {
            if version.name.trim().is_empty() {
                return Err(RegistryError::EmptyName { index });
            }
            if !seen.insert(version.name.as_str()) {
                return Err(RegistryError::DuplicateName {
                    index,
                    name: version.name.clone(),
                });
            }
        }

        Ok(Self { versions })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    /// Position of the first version with this name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.versions.iter().position(|v| v.name == name)
    }

    /// The newest version, i.e. the one the current implementation speaks.
    pub fn current(&self) -> Option<&Version> {
        self.versions.last()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
