//! The versioning gate.
//!
//! # Data Flow
//! ```text
//! request parts
//!     → bypass predicate        (false ⇒ Bypassed, nothing else runs)
//!     → version source          (error ⇒ Failed(InvalidRegistryEntry))
//!     → version extractor       (None ⇒ default version, if configured)
//!     → resolver                (no match ⇒ Failed(NoMatchingVersion))
//!     → endpoint accessor + route filter
//!     → VersionContext { Resolved, chain }
//! ```
//!
//! # Design Decisions
//! - Every collaborator is injected; nothing is looked up globally
//! - The gate never invokes a change; it only decides which ones apply

use axum::http::request::Parts;
use std::sync::Arc;

use crate::versioning::change::{Change, Endpoint};
use crate::versioning::context::VersionContext;
use crate::versioning::extract::{VersionExtractor, VersionStrategy};
use crate::versioning::filter::filter_for_endpoint;
use crate::versioning::resolver::{resolve, ResolveError};
use crate::versioning::source::VersionSource;

/// Decides per request whether versioning applies at all.
pub trait BypassPredicate: Send + Sync {
    /// `true` to version the request, `false` to bypass it.
    fn applies(&self, parts: &Parts) -> bool;
}

/// Applies versioning to every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysApply;

impl BypassPredicate for AlwaysApply {
    fn applies(&self, _parts: &Parts) -> bool {
        true
    }
}

/// Adapts a closure into a bypass predicate.
pub struct FnPredicate<F>(pub F);

impl<F> BypassPredicate for FnPredicate<F>
where
    F: Fn(&Parts) -> bool + Send + Sync,
{
    fn applies(&self, parts: &Parts) -> bool {
        (self.0)(parts)
    }
}

/// Derives the endpoint identity of a request, as assigned by the host router.
pub trait EndpointAccessor: Send + Sync {
    fn endpoint(&self, parts: &Parts) -> Option<Endpoint>;
}

/// Reads an `Endpoint` that an outer layer already placed in the request extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionEndpoint;

impl EndpointAccessor for ExtensionEndpoint {
    fn endpoint(&self, parts: &Parts) -> Option<Endpoint> {
        parts.extensions.get::<Endpoint>().cloned()
    }
}

pub struct VersionGate {
    source: Arc<dyn VersionSource>,
    extractor: Arc<dyn VersionExtractor>,
    bypass: Arc<dyn BypassPredicate>,
    endpoints: Arc<dyn EndpointAccessor>,
    default_version: Option<String>,
}

impl VersionGate {
    /// Gate with header extraction, no bypass and extension-based endpoints.
    pub fn new(source: Arc<dyn VersionSource>) -> Self {
        Self {
            source,
            extractor: Arc::new(VersionStrategy::default()),
            bypass: Arc::new(AlwaysApply),
            endpoints: Arc::new(ExtensionEndpoint),
            default_version: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn VersionExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_bypass(mut self, bypass: Arc<dyn BypassPredicate>) -> Self {
        self.bypass = bypass;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Arc<dyn EndpointAccessor>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Version assumed when the request names none.
    pub fn with_default_version(mut self, version: Option<String>) -> Self {
        self.default_version = version;
        self
    }

    /// Evaluate the gate for one request.
    ///
    /// The returned context is `Bypassed`, `Failed(_)` or `Resolved`.
    pub fn evaluate(&self, parts: &Parts) -> VersionContext {
        if !self.bypass.applies(parts) {
            return VersionContext::bypassed();
        }

        match self.resolve_chain(parts) {
            Ok((version, endpoint, chain)) => VersionContext::resolved(version, endpoint, chain),
            Err(error) => VersionContext::failed(error),
        }
    }

    fn resolve_chain(
        &self,
        parts: &Parts,
    ) -> Result<(String, Option<Endpoint>, Vec<Arc<dyn Change>>), ResolveError> {
        let registry = self.source.registry()?;

        let requested = self
            .extractor
            .extract(parts)
            .or_else(|| self.default_version.clone());
        let chain = resolve(&registry, requested.as_deref())?;

        let endpoint = self.endpoints.endpoint(parts);
        let chain = filter_for_endpoint(chain, endpoint.as_ref());

        // `resolve` only succeeds for a named version.
        let version = requested.unwrap_or_default();
        Ok((version, endpoint, chain))
    }
}
