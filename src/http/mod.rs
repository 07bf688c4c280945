//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID)
//!     → [router matches route]
//!     → middleware/versioning.rs (gate, request pipeline)
//!     → params.rs (collect, re-encode, expose to handlers)
//!     → [handler]
//!     → response.rs (response pipeline)
//!     → Send to client
//! ```

pub mod error;
pub mod middleware;
pub mod params;
pub mod request;
pub mod response;
pub mod server;

pub use error::HttpError;
pub use middleware::{versioning_middleware, InvalidVersionHandler, VersioningState};
pub use params::ApiVersion;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{HttpServer, RegistryReloader};
