//! Requested-version extraction.
//!
//! # Strategies
//! - `header`: value of a request header (default `x-api-version`)
//! - `query`: value of a query-string parameter
//! - `path_segment`: the n-th non-empty path segment (`/v2/users` → index 0 → `v2`)
//! - `media_type`: a parameter on the `Accept` header
//!   (`application/json; version=2024-01-01`)
//!
//! # Design Decisions
//! - Extraction never fails; "not found" is `None` and resolution decides
//! - Values are trimmed; an empty value counts as not found

use axum::http::{header, request::Parts};
use serde::{Deserialize, Serialize};

/// Maps a request to the version identifier the client asked for.
pub trait VersionExtractor: Send + Sync {
    fn extract(&self, parts: &Parts) -> Option<String>;
}

/// Where to look for the requested version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VersionStrategy {
    Header { name: String },
    Query { param: String },
    PathSegment { index: usize },
    MediaType { param: String },
}

impl Default for VersionStrategy {
    fn default() -> Self {
        VersionStrategy::Header {
            name: "x-api-version".to_string(),
        }
    }
}

impl VersionExtractor for VersionStrategy {
    fn extract(&self, parts: &Parts) -> Option<String> {
        let found = match self {
            VersionStrategy::Header { name } => parts
                .headers
                .get(name.as_str())
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            VersionStrategy::Query { param } => parts.uri.query().and_then(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .filter(|(key, _)| key == param)
                    .map(|(_, value)| value.into_owned())
                    .last()
            }),
            VersionStrategy::PathSegment { index } => parts
                .uri
                .path()
                .split('/')
                .filter(|segment| !segment.is_empty())
                .nth(*index)
                .map(str::to_string),
            VersionStrategy::MediaType { param } => parts
                .headers
                .get_all(header::ACCEPT)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .flat_map(|value| value.split(','))
                .find_map(|media_type| media_type_param(media_type, param)),
        };

        found
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

fn media_type_param(media_type: &str, param: &str) -> Option<String> {
    media_type.split(';').skip(1).find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key.trim().eq_ignore_ascii_case(param) {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_header_strategy() {
        let strategy = VersionStrategy::default();
        let req = parts(Request::builder().uri("/users").header("X-Api-Version", " 2024-01-01 "));
        assert_eq!(strategy.extract(&req), Some("2024-01-01".to_string()));

        let missing = parts(Request::builder().uri("/users"));
        assert_eq!(strategy.extract(&missing), None);

        let empty = parts(Request::builder().uri("/users").header("x-api-version", ""));
        assert_eq!(strategy.extract(&empty), None);
    }

    #[test]
    fn test_query_strategy() {
        let strategy = VersionStrategy::Query {
            param: "api_version".into(),
        };
        let req = parts(Request::builder().uri("/users?page=2&api_version=2023%2D06%2D01"));
        assert_eq!(strategy.extract(&req), Some("2023-06-01".to_string()));

        let other = parts(Request::builder().uri("/users?page=2"));
        assert_eq!(strategy.extract(&other), None);
    }

    #[test]
    fn test_path_segment_strategy() {
        let strategy = VersionStrategy::PathSegment { index: 0 };
        let req = parts(Request::builder().uri("/v2/users/7"));
        assert_eq!(strategy.extract(&req), Some("v2".to_string()));

        let root = parts(Request::builder().uri("/"));
        assert_eq!(strategy.extract(&root), None);
    }

    #[test]
    fn test_media_type_strategy() {
        let strategy = VersionStrategy::MediaType {
            param: "version".into(),
        };
        let req = parts(
            Request::builder()
                .uri("/users")
                .header("accept", "text/html, application/json; charset=utf-8; version=\"2023-01-01\""),
        );
        assert_eq!(strategy.extract(&req), Some("2023-01-01".to_string()));

        let plain = parts(Request::builder().uri("/users").header("accept", "application/json"));
        assert_eq!(strategy.extract(&plain), None);
    }

    #[test]
    fn test_strategy_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            strategy: VersionStrategy,
        }

        let parsed: Wrapper = toml::from_str(r#"strategy = { kind = "path_segment", index = 1 }"#).unwrap();
        assert_eq!(parsed.strategy, VersionStrategy::PathSegment { index: 1 });
    }
}
