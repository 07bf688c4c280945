//! Request and response pipelines.
//!
//! # Data Flow
//! ```text
//! Request (legacy shape):
//!     body/query/path
//!     → change[0] → change[1] → ... → change[n]   (forward, oldest first)
//!     → merged = original merged ⊕ body ⊕ query ⊕ path
//!
//! Response (current shape):
//!     payload
//!     → change[n] → ... → change[1] → change[0]   (reverse, newest first)
//! ```
//!
//! # Design Decisions
//! - Each change sees the previous change's output, never the original request
//! - Overlay precedence is path > query > body, matching the host router
//! - Errors are not caught; the first failing change aborts the fold

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::versioning::change::{Change, Endpoint, Params, TransformError};

/// The parameter state of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestParams {
    pub body: Params,
    pub query: Params,
    pub path: Params,
    /// Unified view used by handlers that do not care about the namespace.
    pub merged: Params,
}

impl RequestParams {
    /// Build from the three namespaces, merging them the way the router does.
    pub fn new(body: Params, query: Params, path: Params) -> Self {
        let merged = overlay(&Params::new(), [&body, &query, &path]);
        Self {
            body,
            query,
            path,
            merged,
        }
    }

    /// Build with an explicit pre-merged mapping supplied by the host.
    pub fn with_merged(body: Params, query: Params, path: Params, merged: Params) -> Self {
        Self {
            body,
            query,
            path,
            merged,
        }
    }

    /// Look a key up in the unified mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.merged.get(key)
    }
}

fn overlay<'a>(base: &Params, layers: impl IntoIterator<Item = &'a Params>) -> Params {
    let mut merged = base.clone();
    for layer in layers {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Apply the request transforms of `chain` in forward order.
pub fn apply_request(
    chain: &[Arc<dyn Change>],
    endpoint: &Endpoint,
    params: RequestParams,
) -> Result<RequestParams, TransformError> {
    let RequestParams {
        mut body,
        mut query,
        mut path,
        merged,
    } = params;

    for change in chain {
        body = change.transform_request_body(body, endpoint)?;
        query = change.transform_request_query(query, endpoint)?;
        path = change.transform_request_path(path, endpoint)?;
    }

    let merged = overlay(&merged, [&body, &query, &path]);
    Ok(RequestParams {
        body,
        query,
        path,
        merged,
    })
}

/// Apply the response transforms of `chain` in reverse order.
pub fn apply_response(
    chain: &[Arc<dyn Change>],
    endpoint: &Endpoint,
    payload: Value,
) -> Result<Value, TransformError> {
    chain
        .iter()
        .rev()
        .try_fold(payload, |payload, change| {
            change.transform_response(payload, endpoint)
        })
}
