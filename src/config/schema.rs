//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::versioning::builtin::ParamLocation;
use crate::versioning::extract::VersionStrategy;
use crate::versioning::Endpoint;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Version extraction, bypass and body limits.
    pub versioning: VersioningConfig,

    /// Versions, oldest first. The last entry is the current API.
    pub versions: Vec<VersionConfig>,

    /// Change units referenced by `versions`.
    pub changes: Vec<ChangeConfig>,

    /// Extra route → endpoint identities on top of the ones the host registers.
    pub endpoints: Vec<EndpointRouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// How requests are matched to versions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Master switch. When false every request bypasses versioning.
    pub enabled: bool,

    /// Where the requested version is read from.
    pub strategy: VersionStrategy,

    /// Version assumed when the request names none.
    pub default_version: Option<String>,

    /// Path prefixes that are never versioned (health checks, admin).
    pub unversioned_paths: Vec<String>,

    /// Hosts that are never versioned.
    pub unversioned_hosts: Vec<String>,

    /// Maximum request body buffered for transformation, in bytes.
    pub max_body_bytes: usize,

    /// Maximum JSON response buffered for translation, in bytes.
    pub max_response_bytes: usize,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: VersionStrategy::default(),
            default_version: None,
            unversioned_paths: vec!["/health".to_string()],
            unversioned_hosts: Vec::new(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            max_response_bytes: 16 * 1024 * 1024, // 16MB
        }
    }
}

/// One entry of the version registry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionConfig {
    /// Version name as sent by clients (e.g. "2024-01-01").
    pub name: String,

    /// Ids of the changes that lift this version to the next one, in order.
    #[serde(default)]
    pub changes: Vec<String>,
}

/// A declarative change unit.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChangeConfig {
    /// Unique id referenced from `versions[].changes`.
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Endpoints this change applies to.
    #[serde(default)]
    pub routes: Vec<Endpoint>,

    pub transform: TransformConfig,
}

/// The transformation a declarative change performs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformConfig {
    RenameField {
        #[serde(default)]
        location: ParamLocation,
        legacy: String,
        current: String,
    },
    DefaultValue {
        #[serde(default)]
        location: ParamLocation,
        field: String,
        value: Value,
    },
    HideField {
        field: String,
    },
}

/// Maps a routed request (method + route template) to an endpoint identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointRouteConfig {
    /// HTTP method, e.g. "GET".
    pub method: String,

    /// Route template exactly as registered with the router, e.g. "/users/{id}".
    pub path: String,

    pub handler: String,
    pub action: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Default admin key; the admin API refuses to start with it.
pub const PLACEHOLDER_API_KEY: &str = "CHANGE_ME_IN_PRODUCTION";

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin endpoints.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: PLACEHOLDER_API_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.versioning.enabled);
        assert_eq!(config.versioning.unversioned_paths, vec!["/health"]);
        assert!(config.versions.is_empty());
        assert!(!config.admin.enabled);
    }

    #[test]
    fn test_full_config_parses() {
        let config: AppConfig = toml::from_str(
            r#"
            [versioning]
            strategy = { kind = "query", param = "v" }
            default_version = "2023-01-01"

            [[versions]]
            name = "2023-01-01"
            changes = ["users-full-name", "users-role"]

            [[versions]]
            name = "2024-01-01"

            [[changes]]
            id = "users-full-name"
            routes = [{ handler = "users", action = "show" }]
            transform = { kind = "rename_field", legacy = "name", current = "full_name" }

            [[changes]]
            id = "users-role"
            routes = [{ handler = "users", action = "create" }]
            transform = { kind = "default_value", location = "body", field = "role", value = "member" }

            [[endpoints]]
            method = "GET"
            path = "/users/{id}"
            handler = "users"
            action = "show"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.versioning.strategy,
            VersionStrategy::Query { param: "v".into() }
        );
        assert_eq!(config.versions.len(), 2);
        assert!(config.versions[1].changes.is_empty());
        assert_eq!(config.changes[0].routes, vec![Endpoint::new("users", "show")]);
        match &config.changes[1].transform {
            TransformConfig::DefaultValue { location, field, value } => {
                assert_eq!(*location, ParamLocation::Body);
                assert_eq!(field, "role");
                assert_eq!(value, &json!("member"));
            }
            other => panic!("unexpected transform {:?}", other),
        }
        assert_eq!(config.endpoints[0].path, "/users/{id}");
    }
}
