//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (default version is declared)
//! - Validate value ranges (timeouts > 0, body limit > 0, addresses parse)
//! - Detect duplicate version names and change ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{HeaderName, Method};
use thiserror::Error;

use crate::config::schema::{AppConfig, TransformConfig};
use crate::versioning::VersionStrategy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid listener bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("max_response_bytes must be greater than zero")]
    ZeroResponseLimit,

    #[error("invalid version header name '{0}'")]
    InvalidHeaderName(String),

    #[error("version query parameter must not be empty")]
    EmptyQueryParam,

    #[error("media type parameter must not be empty")]
    EmptyMediaTypeParam,

    #[error("version at index {0} has an empty name")]
    EmptyVersionName(usize),

    #[error("version '{0}' is declared more than once")]
    DuplicateVersion(String),

    #[error("default_version '{0}' is not a declared version")]
    UnknownDefaultVersion(String),

    #[error("change at index {0} has an empty id")]
    EmptyChangeId(usize),

    #[error("change '{0}' is declared more than once")]
    DuplicateChange(String),

    #[error("change '{change}': {reason}")]
    InvalidTransform { change: String, reason: String },

    #[error("endpoint {index}: invalid method '{method}'")]
    InvalidEndpointMethod { index: usize, method: String },

    #[error("endpoint {index}: path '{path}' must start with '/'")]
    InvalidEndpointPath { index: usize, path: String },

    #[error("endpoint {0}: handler and action must not be empty")]
    EmptyEndpointIdentity(usize),

    #[error("unknown log format '{0}' (expected \"pretty\" or \"json\")")]
    InvalidLogFormat(String),

    #[error("admin API is enabled with the placeholder API key")]
    PlaceholderAdminKey,
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    validate_versioning(config, &mut errors);
    validate_registry(config, &mut errors);
    validate_endpoints(config, &mut errors);

    let observability = &config.observability;
    if !matches!(observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::InvalidLogFormat(observability.log_format.clone()));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if config.admin.enabled && config.admin.api_key == crate::config::schema::PLACEHOLDER_API_KEY {
        errors.push(ValidationError::PlaceholderAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_versioning(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    let versioning = &config.versioning;

    if versioning.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if versioning.max_response_bytes == 0 {
        errors.push(ValidationError::ZeroResponseLimit);
    }

    match &versioning.strategy {
        VersionStrategy::Header { name } => {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                errors.push(ValidationError::InvalidHeaderName(name.clone()));
            }
        }
        VersionStrategy::Query { param } if param.trim().is_empty() => {
            errors.push(ValidationError::EmptyQueryParam);
        }
        VersionStrategy::MediaType { param } if param.trim().is_empty() => {
            errors.push(ValidationError::EmptyMediaTypeParam);
        }
        _ => {}
    }

    if let Some(default) = &versioning.default_version {
        if !config.versions.iter().any(|v| &v.name == default) {
            errors.push(ValidationError::UnknownDefaultVersion(default.clone()));
        }
    }
}

fn validate_registry(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    let mut change_ids = HashSet::new();
    for (index, change) in config.changes.iter().enumerate() {
        if change.id.trim().is_empty() {
            errors.push(ValidationError::EmptyChangeId(index));
            continue;
        }
        if !change_ids.insert(change.id.as_str()) {
            errors.push(ValidationError::DuplicateChange(change.id.clone()));
        }
        if let Some(reason) = transform_problem(&change.transform) {
            errors.push(ValidationError::InvalidTransform {
                change: change.id.clone(),
                reason: reason.to_string(),
            });
        }
    }

    let mut version_names = HashSet::new();
    for (index, version) in config.versions.iter().enumerate() {
        if version.name.trim().is_empty() {
            errors.push(ValidationError::EmptyVersionName(index));
        } else if !version_names.insert(version.name.as_str()) {
            errors.push(ValidationError::DuplicateVersion(version.name.clone()));
        }
    }
}

fn transform_problem(transform: &TransformConfig) -> Option<&'static str> {
    match transform {
        TransformConfig::RenameField { legacy, current, .. } => {
            if legacy.is_empty() || current.is_empty() {
                Some("rename_field needs non-empty legacy and current names")
            } else if legacy == current {
                Some("rename_field legacy and current names are identical")
            } else {
                None
            }
        }
        TransformConfig::DefaultValue { field, .. } | TransformConfig::HideField { field } => {
            field.is_empty().then_some("field name must not be empty")
        }
    }
}

fn validate_endpoints(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    for (index, endpoint) in config.endpoints.iter().enumerate() {
        if endpoint.method.to_uppercase().parse::<Method>().is_err() {
            errors.push(ValidationError::InvalidEndpointMethod {
                index,
                method: endpoint.method.clone(),
            });
        }
        if !endpoint.path.starts_with('/') {
            errors.push(ValidationError::InvalidEndpointPath {
                index,
                path: endpoint.path.clone(),
            });
        }
        if endpoint.handler.is_empty() || endpoint.action.is_empty() {
            errors.push(ValidationError::EmptyEndpointIdentity(index));
        }
    }
}
