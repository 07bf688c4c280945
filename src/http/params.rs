//! Request parameter collection and re-encoding.
//!
//! # Responsibilities
//! - Gather path, query and body parameters of a routed request
//! - Re-encode the query string and body after the request pipeline ran
//! - Expose the transformed parameters to handlers
//!
//! # Design Decisions
//! - Only JSON objects and urlencoded forms yield body params; anything else
//!   passes through byte-for-byte
//! - Query string and body are rewritten only when a change touched them
//! - Path captures stay as the router saw them; handlers read the
//!   transformed ones from `RequestParams`

use axum::body::{Body, Bytes, HttpBody};
use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Uri};
use serde_json::Value;

use crate::http::error::HttpError;
use crate::versioning::{Params, RequestParams};

/// The version a request was resolved against, for handlers that care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion(pub String);

impl ApiVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Form,
    Opaque,
}

/// A buffered request, before the request pipeline.
#[derive(Debug)]
pub struct CollectedRequest {
    pub params: RequestParams,
    pub format: BodyFormat,
    pub raw_body: Bytes,
}

/// Buffer the body and gather all three parameter namespaces.
pub async fn collect(parts: &mut Parts, body: Body, limit: usize) -> Result<CollectedRequest, HttpError> {
    let path = path_params(parts).await;
    let query = query_params(parts);

    let raw_body = read_body(&parts.headers, body, limit).await?;
    let format = body_format(&parts.headers);
    let body = parse_body(format, &raw_body)?;

    Ok(CollectedRequest {
        params: RequestParams::new(body, query, path),
        format,
        raw_body,
    })
}

/// Path and query params only. The body is left unread, so no size limit or
/// parsing applies and body params are empty.
pub async fn unversioned(parts: &mut Parts) -> RequestParams {
    let path = path_params(parts).await;
    RequestParams::new(Params::new(), query_params(parts), path)
}

/// Write transformed query and body params back into the request.
pub fn rebuild(
    parts: &mut Parts,
    collected: CollectedRequest,
    transformed: &RequestParams,
) -> Result<Body, HttpError> {
    if transformed.query != collected.params.query {
        parts.uri = with_query(&parts.uri, &encode_pairs(&transformed.query))?;
    }

    if transformed.body == collected.params.body {
        return Ok(Body::from(collected.raw_body));
    }

    let encoded = match collected.format {
        BodyFormat::Json => serde_json::to_vec(&transformed.body)
            .map_err(|e| HttpError::Rewrite(e.to_string()))?,
        BodyFormat::Form => encode_pairs(&transformed.body).into_bytes(),
        BodyFormat::Opaque => {
            tracing::debug!("Body params changed on an opaque body; keeping original bytes");
            return Ok(Body::from(collected.raw_body));
        }
    };

    parts.headers.remove(header::TRANSFER_ENCODING);
    parts
        .headers
        .insert(header::CONTENT_LENGTH, HeaderValue::from(encoded.len()));
    Ok(Body::from(encoded))
}

async fn path_params(parts: &mut Parts) -> Params {
    match RawPathParams::from_request_parts(parts, &()).await {
        Ok(raw) => raw
            .iter()
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect(),
        Err(_) => Params::new(),
    }
}

fn query_params(parts: &Parts) -> Params {
    parts
        .uri
        .query()
        .map(|q| parse_pairs(q.as_bytes()))
        .unwrap_or_default()
}

async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, HttpError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    if declared > limit as u64 || body.size_hint().lower() > limit as u64 {
        return Err(HttpError::BodyTooLarge { limit });
    }

    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if is_length_limit(&e) {
            HttpError::BodyTooLarge { limit }
        } else {
            HttpError::BodyRead(e.to_string())
        }
    })
}

fn is_length_limit(error: &axum::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(e) = current {
        if e.to_string().contains("length limit exceeded") {
            return true;
        }
        current = e.source();
    }
    false
}

/// `true` for `application/json` and any `+json` media type.
pub fn is_json(headers: &HeaderMap) -> bool {
    matches!(media_type(headers).as_deref(), Some(m) if m == "application/json" || m.ends_with("+json"))
}

fn media_type(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let essence = value.split(';').next()?.trim();
    Some(essence.to_ascii_lowercase())
}

fn body_format(headers: &HeaderMap) -> BodyFormat {
    if is_json(headers) {
        BodyFormat::Json
    } else if media_type(headers).as_deref() == Some("application/x-www-form-urlencoded") {
        BodyFormat::Form
    } else {
        BodyFormat::Opaque
    }
}

fn parse_body(format: BodyFormat, raw: &Bytes) -> Result<Params, HttpError> {
    if raw.is_empty() {
        return Ok(Params::new());
    }
    match format {
        BodyFormat::Json => match serde_json::from_slice::<Value>(raw)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Params::new()),
        },
        BodyFormat::Form => Ok(parse_pairs(raw)),
        BodyFormat::Opaque => Ok(Params::new()),
    }
}

/// Repeated keys: the last one wins.
fn parse_pairs(input: &[u8]) -> Params {
    url::form_urlencoded::parse(input)
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}

fn encode_pairs(params: &Params) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, &scalar(value));
    }
    serializer.finish()
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn with_query(uri: &Uri, query: &str) -> Result<Uri, HttpError> {
    let path_and_query = if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    };

    let mut uri_parts = uri.clone().into_parts();
    uri_parts.path_and_query = Some(
        path_and_query
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| HttpError::Rewrite(e.to_string()))?,
    );
    Uri::from_parts(uri_parts).map_err(|e| HttpError::Rewrite(e.to_string()))
}

impl<S> FromRequestParts<S> for RequestParams
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestParams>()
            .cloned()
            .ok_or(HttpError::MissingParams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde_json::json;

    fn request(uri: &str, content_type: Option<&str>, body: &'static str) -> (Parts, Body) {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header(header::CONTENT_TYPE, ct);
        }
        builder.body(Body::from(body)).unwrap().into_parts()
    }

    fn obj(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_collects_json_and_query() {
        let (mut parts, body) = request(
            "/users?page=2&page=3",
            Some("application/json; charset=utf-8"),
            r#"{"name":"Ada","age":36}"#,
        );

        let collected = collect(&mut parts, body, 1024).await.unwrap();
        assert_eq!(collected.format, BodyFormat::Json);
        assert_eq!(collected.params.body, obj(json!({"name": "Ada", "age": 36})));
        assert_eq!(collected.params.query, obj(json!({"page": "3"})));
        assert_eq!(collected.params.get("name"), Some(&json!("Ada")));
    }

    #[tokio::test]
    async fn test_collects_form() {
        let (mut parts, body) = request(
            "/users",
            Some("application/x-www-form-urlencoded"),
            "name=Ada+Lovelace&role=admin",
        );

        let collected = collect(&mut parts, body, 1024).await.unwrap();
        assert_eq!(collected.format, BodyFormat::Form);
        assert_eq!(
            collected.params.body,
            obj(json!({"name": "Ada Lovelace", "role": "admin"}))
        );
    }

    #[tokio::test]
    async fn test_opaque_and_non_object_bodies() {
        let (mut parts, body) = request("/upload", Some("text/plain"), "hello");
        let collected = collect(&mut parts, body, 1024).await.unwrap();
        assert_eq!(collected.format, BodyFormat::Opaque);
        assert!(collected.params.body.is_empty());
        assert_eq!(collected.raw_body, Bytes::from_static(b"hello"));

        let (mut parts, body) = request("/batch", Some("application/json"), "[1,2]");
        let collected = collect(&mut parts, body, 1024).await.unwrap();
        assert!(collected.params.body.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let (mut parts, body) = request("/users", Some("application/json"), "{nope");
        let err = collect(&mut parts, body, 1024).await.unwrap_err();
        assert!(matches!(err, HttpError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn test_body_limit() {
        let (mut parts, body) = request("/users", Some("application/json"), r#"{"name":"Ada"}"#);
        let err = collect(&mut parts, body, 4).await.unwrap_err();
        assert!(matches!(err, HttpError::BodyTooLarge { limit: 4 }));
    }

    #[tokio::test]
    async fn test_unversioned_leaves_body_alone() {
        let (mut parts, body) = request("/users?page=2", Some("application/json"), "{nope");

        let params = unversioned(&mut parts).await;
        assert!(params.body.is_empty());
        assert_eq!(params.query, obj(json!({"page": "2"})));

        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(bytes, Bytes::from_static(b"{nope"));
    }

    #[tokio::test]
    async fn test_rebuild_rewrites_only_what_changed() {
        let (mut parts, body) = request("/users?v=1", Some("application/json"), r#"{"name":"Ada"}"#);
        let collected = collect(&mut parts, body, 1024).await.unwrap();

        let mut transformed = collected.params.clone();
        transformed.body = obj(json!({"full_name": "Ada"}));

        let body = rebuild(&mut parts, collected, &transformed).unwrap();
        assert_eq!(parts.uri, "/users?v=1");
        assert_eq!(parts.headers[header::CONTENT_LENGTH], "19");

        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"full_name": "Ada"}));
    }

    #[tokio::test]
    async fn test_rebuild_query() {
        let (mut parts, body) = request("/users?sort=name", None, "");
        let collected = collect(&mut parts, body, 1024).await.unwrap();

        let mut transformed = collected.params.clone();
        transformed.query = obj(json!({"order": "name asc", "limit": 10}));

        rebuild(&mut parts, collected, &transformed).unwrap();
        assert_eq!(parts.uri.path(), "/users");
        assert_eq!(parts.uri.query(), Some("limit=10&order=name+asc"));
    }

    #[tokio::test]
    async fn test_extractor_requires_middleware() {
        let (mut parts, _) = request("/users", None, "");
        let err = RequestParams::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, HttpError::MissingParams));

        parts.extensions.insert(RequestParams::default());
        assert!(RequestParams::from_request_parts(&mut parts, &()).await.is_ok());
    }
}
