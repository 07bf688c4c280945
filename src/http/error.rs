//! HTTP-facing error type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::versioning::{ContextError, ResolveError};

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Malformed JSON body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("{0}")]
    InvalidVersion(ResolveError),

    #[error("Version registry unavailable: {0}")]
    Registry(ResolveError),

    #[error("Version transform failed: {0}")]
    Transform(#[from] ContextError),

    #[error("Failed to buffer response body: {0}")]
    ResponseBody(String),

    #[error("Failed to rewrite request: {0}")]
    Rewrite(String),

    #[error("Request parameters are not available; is the versioning middleware installed?")]
    MissingParams,
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HttpError::BodyRead(_) | HttpError::MalformedBody(_) | HttpError::InvalidVersion(_) => {
                StatusCode::BAD_REQUEST
            }
            HttpError::Registry(_)
            | HttpError::Transform(_)
            | HttpError::ResponseBody(_)
            | HttpError::Rewrite(_)
            | HttpError::MissingParams => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ResolveError> for HttpError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::NoMatchingVersion { .. } => HttpError::InvalidVersion(error),
            ResolveError::InvalidRegistryEntry(_) => HttpError::Registry(error),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Versioning error");
        }

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}
