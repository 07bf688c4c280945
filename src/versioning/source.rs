//! Version sources.
//!
//! # Responsibilities
//! - Hand the gate the registry to resolve against
//! - Support atomic replacement on config reload
//!
//! # Design Decisions
//! - Readers never lock: `ArcSwap` publishes a whole new registry
//! - A source that cannot produce a registry fails the request fatally

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::versioning::registry::{RegistryError, VersionRegistry};

/// Supplies the ordered version registry for a request.
pub trait VersionSource: Send + Sync {
    fn registry(&self) -> Result<Arc<VersionRegistry>, RegistryError>;
}

/// A fixed registry.
impl VersionSource for Arc<VersionRegistry> {
    fn registry(&self) -> Result<Arc<VersionRegistry>, RegistryError> {
        Ok(Arc::clone(self))
    }
}

/// Adapts a closure into a source, for hosts that build registries on demand.
pub struct FnSource<F>(pub F);

impl<F> VersionSource for FnSource<F>
where
    F: Fn() -> Result<Arc<VersionRegistry>, RegistryError> + Send + Sync,
{
    fn registry(&self) -> Result<Arc<VersionRegistry>, RegistryError> {
        (self.0)()
    }
}

/// A registry that can be swapped at runtime.
#[derive(Debug, Clone)]
pub struct SharedRegistry {
    inner: Arc<ArcSwap<VersionRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: VersionRegistry) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(registry)),
        }
    }

    /// Snapshot of the registry currently in effect.
    pub fn current(&self) -> Arc<VersionRegistry> {
        self.inner.load_full()
    }

    /// Publish a replacement. In-flight requests keep their snapshot.
    pub fn replace(&self, registry: VersionRegistry) {
        self.inner.store(Arc::new(registry));
    }
}

impl VersionSource for SharedRegistry {
    fn registry(&self) -> Result<Arc<VersionRegistry>, RegistryError> {
        Ok(self.current())
    }
}
