//! HTTP API versioning.
//!
//! Clients pin an API version; handlers only ever speak the current one.
//! Each version lists the changes that lift its requests to the next version
//! and bring responses back down. The middleware resolves the changes that
//! apply to a request, runs them over its parameters before the handler and
//! over its JSON response afterwards.

pub mod admin;
pub mod config;
pub mod demo;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod versioning;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
