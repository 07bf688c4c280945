//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, matched route, host, path)
//!     → matcher.rs  (is this route outside the versioning scheme?)
//!     → endpoint.rs (which (handler, action) does it reach?)
//!
//! Compilation (at startup):
//!     host route registrations + [[endpoints]] config
//!     → EndpointTable (frozen)
//!     unversioned_paths / unversioned_hosts
//!     → UnversionedRoutes (frozen)
//! ```
//!
//! # Design Decisions
//! - Built at startup, immutable at runtime
//! - Exact endpoint identity; no wildcards
//! - Deterministic: same input always yields the same endpoint

pub mod endpoint;
pub mod matcher;

pub use endpoint::EndpointTable;
pub use matcher::UnversionedRoutes;
