//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → loader::build_registry (changes + versions → VersionRegistry)
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server rebuilds the registry
//!     → atomic swap inside SharedRegistry
//!     → in-flight requests keep the registry they started with
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Only the version registry is hot-reloaded; listener, strategy and
//!   endpoints are fixed at startup

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{build_registry, load_config, parse_config, ConfigError};
pub use schema::AppConfig;
pub use schema::ChangeConfig;
pub use schema::ListenerConfig;
pub use schema::VersionConfig;
pub use schema::VersioningConfig;
pub use validation::ValidationError;
