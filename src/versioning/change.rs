//! Change units.
//!
//! # Responsibilities
//! - Define the endpoint identity used to scope a change
//! - Define the `Change` trait: four transforms, all identity by default
//! - Define the error a transform may raise
//!
//! # Design Decisions
//! - Transforms take ownership of the mapping and hand back a replacement
//! - Changes are `Send + Sync` and shared by `Arc` across versions and requests
//! - A change must be pure: no I/O, no interior state

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// One parameter namespace (body, query or path).
pub type Params = Map<String, Value>;

/// The `(handler, action)` pair identifying which code path a request reaches.
///
/// Equality is exact. There is no wildcard or pattern matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub handler: String,
    pub action: String,
}

impl Endpoint {
    pub fn new(handler: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            action: action.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.handler, self.action)
    }
}

/// Error raised by a change while transforming a request or response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// Both the legacy and the current form of a field were supplied with different values.
    #[error("change '{change}': conflicting values for '{legacy}' and '{current}'")]
    Conflict {
        change: String,
        legacy: String,
        current: String,
    },

    /// The input did not have the shape the change expects for this endpoint.
    #[error("change '{change}' cannot handle {endpoint}: {reason}")]
    Unsupported {
        change: String,
        endpoint: Endpoint,
        reason: String,
    },
}

/// A transformation across one version boundary.
///
/// Request transforms move a legacy request "up" to the current shape;
/// `transform_response` moves the current response back "down".
pub trait Change: Send + Sync + fmt::Debug {
    /// Stable identifier, used in logs, the admin API and config references.
    fn id(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Endpoints this change applies to. Empty means it never applies.
    fn routes(&self) -> &[Endpoint];

    fn applies_to(&self, endpoint: &Endpoint) -> bool {
        self.routes().iter().any(|route| route == endpoint)
    }

    fn transform_request_body(
        &self,
        params: Params,
        _endpoint: &Endpoint,
    ) -> Result<Params, TransformError> {
        Ok(params)
    }

    fn transform_request_query(
        &self,
        params: Params,
        _endpoint: &Endpoint,
    ) -> Result<Params, TransformError> {
        Ok(params)
    }

    fn transform_request_path(
        &self,
        params: Params,
        _endpoint: &Endpoint,
    ) -> Result<Params, TransformError> {
        Ok(params)
    }

    fn transform_response(
        &self,
        payload: Value,
        _endpoint: &Endpoint,
    ) -> Result<Value, TransformError> {
        Ok(payload)
    }
}
