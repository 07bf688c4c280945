//! Versioning middleware.
//!
//! # Data Flow
//! ```text
//! routed request
//!     → VersionGate::evaluate
//!         Bypassed          → handler, path and query params attached, body untouched
//!         NoMatchingVersion → invalid-version handler, halted
//!         registry failure  → 500
//!         Resolved          ↓
//!     → params::collect → request pipeline → params::rebuild
//!     → handler (RequestParams + ApiVersion in extensions)
//!     → response::intercept (once)
//! ```
//!
//! Must be installed with `Router::route_layer` so the matched route is known.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::HttpError;
use crate::http::params::{self, ApiVersion};
use crate::http::request::RequestIdExt;
use crate::http::response;
use crate::observability::metrics::{self, outcome};
use crate::versioning::{ResolveError, Stage, VersionGate};

/// Produces the terminal response for requests naming no known version.
pub type InvalidVersionHandler = Arc<dyn Fn(&Parts, &ResolveError) -> Response + Send + Sync>;

/// Default request body limit when none is configured.
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Default limit on JSON responses buffered for translation.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct VersioningState {
    gate: Arc<VersionGate>,
    on_invalid_version: InvalidVersionHandler,
    max_body_bytes: usize,
    max_response_bytes: usize,
}

impl VersioningState {
    pub fn new(gate: VersionGate) -> Self {
        Self {
            gate: Arc::new(gate),
            on_invalid_version: Arc::new(default_invalid_version),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    pub fn with_invalid_version_handler(mut self, handler: InvalidVersionHandler) -> Self {
        self.on_invalid_version = handler;
        self
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }
}

/// 400 with a JSON error body.
pub fn default_invalid_version(_parts: &Parts, error: &ResolveError) -> Response {
    HttpError::InvalidVersion(error.clone()).into_response()
}

pub async fn versioning_middleware(
    State(state): State<VersioningState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let mut ctx = state.gate.evaluate(&parts);

    match ctx.stage() {
        Stage::Bypassed => {
            metrics::record_request("none", outcome::BYPASSED);
            let params = params::unversioned(&mut parts).await;
            parts.extensions.insert(params);
            return next.run(Request::from_parts(parts, body)).await;
        }
        Stage::Failed(error @ ResolveError::NoMatchingVersion { .. }) => {
            tracing::info!(
                request_id = %parts.headers.request_id(),
                path = %parts.uri.path(),
                error = %error,
                "Rejected request for unknown API version"
            );
            metrics::record_request("invalid", outcome::INVALID_VERSION);
            return (state.on_invalid_version)(&parts, error);
        }
        Stage::Failed(error) => {
            metrics::record_request("invalid", outcome::ERROR);
            return HttpError::Registry(error.clone()).into_response();
        }
        _ => {}
    }

    let version = ctx.version().unwrap_or_default().to_string();
    tracing::debug!(
        request_id = %parts.headers.request_id(),
        version = %version,
        endpoint = ?ctx.endpoint().map(ToString::to_string),
        changes = ctx.chain().len(),
        "Resolved API version"
    );

    let collected = match params::collect(&mut parts, body, state.max_body_bytes).await {
        Ok(collected) => collected,
        Err(error) => {
            metrics::record_request(&version, outcome::ERROR);
            return error.into_response();
        }
    };

    let start = Instant::now();
    let transformed = match ctx.transform_request(collected.params.clone()) {
        Ok(transformed) => transformed,
        Err(error) => {
            metrics::record_request(&version, outcome::ERROR);
            return HttpError::from(error).into_response();
        }
    };
    metrics::record_pipeline("request", ctx.chain().len(), start);

    let body = match params::rebuild(&mut parts, collected, &transformed) {
        Ok(body) => body,
        Err(error) => {
            metrics::record_request(&version, outcome::ERROR);
            return error.into_response();
        }
    };
    parts.extensions.insert(transformed);
    parts.extensions.insert(ApiVersion(version.clone()));

    let response = next.run(Request::from_parts(parts, body)).await;

    let start = Instant::now();
    match response::intercept(&mut ctx, response, state.max_response_bytes).await {
        Ok((response, translated)) => {
            if translated {
                metrics::record_pipeline("response", ctx.chain().len(), start);
            }
            metrics::record_request(&version, outcome::TRANSFORMED);
            response
        }
        Err(error) => {
            metrics::record_request(&version, outcome::ERROR);
            error.into_response()
        }
    }
}
