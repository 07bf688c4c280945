//! API versioning core.
//!
//! # Data Flow
//! ```text
//! Request (version V, endpoint E)
//!     → gate.rs      (bypass? source → extract → resolve)
//!     → resolver.rs  (changes of V and every newer version)
//!     → filter.rs    (only changes declaring E)
//!     → context.rs   (chain cached for the request)
//!     → pipeline.rs  (request transforms, oldest first)
//!     → [handler]
//!     → pipeline.rs  (response transforms, newest first)
//! ```
//!
//! # Design Decisions
//! - Registry is built once and swapped whole, never mutated in place
//! - Resolution, filtering and both pipelines are synchronous and pure
//! - Changes never see unrelated endpoints

pub mod builtin;
pub mod catalog;
pub mod change;
pub mod context;
pub mod extract;
pub mod filter;
pub mod gate;
pub mod mapped;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::ChangeCatalog;
pub use change::{Change, Endpoint, Params, TransformError};
pub use context::{ContextError, Stage, VersionContext};
pub use extract::{VersionExtractor, VersionStrategy};
pub use gate::{BypassPredicate, EndpointAccessor, VersionGate};
pub use mapped::MappedChange;
pub use pipeline::RequestParams;
pub use registry::{RegistryError, Version, VersionRegistry};
pub use resolver::{resolve, ResolveError};
pub use source::{SharedRegistry, VersionSource};
