//! Response interception.
//!
//! # Responsibilities
//! - Buffer JSON responses of versioned requests
//! - Run the response pipeline once and re-serialize
//!
//! # Design Decisions
//! - Non-JSON responses stream through untouched
//! - A body labelled JSON that does not parse is passed through, not rejected
//! - `Content-Length` is refreshed after rewriting

use axum::body::Body;
use axum::http::{header, HeaderValue};
use axum::response::Response;
use serde_json::Value;

use crate::http::error::HttpError;
use crate::http::params::is_json;
use crate::versioning::VersionContext;

/// Translate a current-shape JSON response back to the requested version.
///
/// Returns the response and whether the response pipeline ran. A response
/// left as-is still releases the hook, so the context always ends terminal.
pub async fn intercept(
    ctx: &mut VersionContext,
    response: Response,
    limit: usize,
) -> Result<(Response, bool), HttpError> {
    if !ctx.is_intercepting() {
        return Ok((response, false));
    }
    if !is_json(response.headers()) {
        ctx.release_response()?;
        return Ok((response, false));
    }

    let (mut parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| HttpError::ResponseBody(e.to_string()))?;

    if bytes.is_empty() {
        ctx.release_response()?;
        return Ok((Response::from_parts(parts, Body::from(bytes)), false));
    }

    let payload: Value = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(error) => {
            tracing::warn!(error = %error, "JSON response did not parse; passing through");
            ctx.release_response()?;
            return Ok((Response::from_parts(parts, Body::from(bytes)), false));
        }
    };

    let payload = ctx.transform_response(payload)?;
    let encoded = serde_json::to_vec(&payload).map_err(|e| HttpError::ResponseBody(e.to_string()))?;

    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(encoded.len()));
    Ok((Response::from_parts(parts, Body::from(encoded)), true))
}
