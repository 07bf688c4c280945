//! Request matchers for unversioned routes.
//!
//! # Responsibilities
//! - Match host header (exact match, case-insensitive)
//! - Match path prefix (case-sensitive, segment-aligned)
//! - Combine matchers into the bypass predicate
//!
//! # Design Decisions
//! - Host matching is case-insensitive (per HTTP spec)
//! - Path matching is case-sensitive
//! - `/health` matches `/health` and `/health/live`, never `/healthz`
//! - No regex to guarantee O(n) matching

use axum::http::{header, request::Parts};

use crate::config::schema::VersioningConfig;
use crate::versioning::gate::BypassPredicate;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, parts: &Parts) -> bool;
}

/// Matches the Host header.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, parts: &Parts) -> bool {
        parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(|h| h.to_lowercase() == self.expected_host)
            .unwrap_or(false)
    }
}

/// Matches the request path prefix on a segment boundary.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, parts: &Parts) -> bool {
        let path = parts.uri.path();
        if self.prefix.is_empty() {
            return true;
        }
        match path.strip_prefix(&self.prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Requests matching any of these matchers are not versioned.
#[derive(Debug, Default)]
pub struct UnversionedRoutes {
    enabled: bool,
    matchers: Vec<Box<dyn Matcher>>,
}

impl UnversionedRoutes {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self {
            enabled: true,
            matchers,
        }
    }

    pub fn from_config(config: &VersioningConfig) -> Self {
        let paths = config
            .unversioned_paths
            .iter()
            .map(|p| Box::new(PathPrefixMatcher::new(p.as_str())) as Box<dyn Matcher>);
        let hosts = config
            .unversioned_hosts
            .iter()
            .map(|h| Box::new(HostMatcher::new(h.as_str())) as Box<dyn Matcher>);

        Self {
            enabled: config.enabled,
            matchers: paths.chain(hosts).collect(),
        }
    }
}

impl BypassPredicate for UnversionedRoutes {
    fn applies(&self, parts: &Parts) -> bool {
        self.enabled && !self.matchers.iter().any(|m| m.matches(parts))
    }
}
