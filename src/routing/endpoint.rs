//! Route → endpoint identity lookup.
//!
//! # Responsibilities
//! - Store (method, route template) → (handler, action) pairs
//! - Identify the endpoint of a routed request
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) lookup via HashMap keyed by the router's matched template
//! - Explicit `None` for unknown routes rather than a silent default
//! - Requires `MatchedPath`, so the middleware must run as a route layer

use axum::extract::MatchedPath;
use axum::http::{request::Parts, Method};
use std::collections::HashMap;

use crate::config::schema::EndpointRouteConfig;
use crate::versioning::gate::EndpointAccessor;
use crate::versioning::Endpoint;

#[derive(Debug, Clone, Default)]
pub struct EndpointTable {
    routes: HashMap<(Method, String), Endpoint>,
}

impl EndpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint identity for `method` + route template `path`.
    pub fn with(mut self, method: Method, path: impl Into<String>, endpoint: Endpoint) -> Self {
        self.insert(method, path, endpoint);
        self
    }

    pub fn insert(&mut self, method: Method, path: impl Into<String>, endpoint: Endpoint) {
        let path = path.into();
        if let Some(previous) = self.routes.insert((method.clone(), path.clone()), endpoint.clone()) {
            tracing::warn!(
                method = %method,
                path = %path,
                previous = %previous,
                replacement = %endpoint,
                "Endpoint identity overridden"
            );
        }
    }

    /// Add the entries declared in config; invalid methods are skipped with a warning.
    pub fn extend_from_config(&mut self, configs: &[EndpointRouteConfig]) {
        for config in configs {
            match config.method.to_uppercase().parse::<Method>() {
                Ok(method) => self.insert(
                    method,
                    config.path.clone(),
                    Endpoint::new(config.handler.clone(), config.action.clone()),
                ),
                Err(_) => tracing::warn!(method = %config.method, path = %config.path, "Invalid endpoint method"),
            }
        }
    }

    /// HEAD falls back to the GET entry, as the router serves HEAD from GET handlers.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&Endpoint> {
        let path = path.to_string();
        self.routes.get(&(method.clone(), path.clone())).or_else(|| {
            (*method == Method::HEAD)
                .then(|| self.routes.get(&(Method::GET, path)))
                .flatten()
        })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl EndpointAccessor for EndpointTable {
    fn endpoint(&self, parts: &Parts) -> Option<Endpoint> {
        if let Some(endpoint) = parts.extensions.get::<Endpoint>() {
            return Some(endpoint.clone());
        }
        let matched = parts.extensions.get::<MatchedPath>()?;
        self.lookup(&parts.method, matched.as_str()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_lookup() {
        let table = EndpointTable::new()
            .with(Method::GET, "/users/{id}", Endpoint::new("users", "show"))
            .with(Method::POST, "/users", Endpoint::new("users", "create"));

        assert_eq!(
            table.lookup(&Method::GET, "/users/{id}"),
            Some(&Endpoint::new("users", "show"))
        );
        assert_eq!(table.lookup(&Method::DELETE, "/users/{id}"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_head_falls_back_to_get() {
        let table = EndpointTable::new()
            .with(Method::GET, "/users/{id}", Endpoint::new("users", "show"))
            .with(Method::HEAD, "/users", Endpoint::new("users", "head_index"))
            .with(Method::GET, "/users", Endpoint::new("users", "index"));

        assert_eq!(
            table.lookup(&Method::HEAD, "/users/{id}"),
            Some(&Endpoint::new("users", "show"))
        );
        // An explicit HEAD entry wins.
        assert_eq!(
            table.lookup(&Method::HEAD, "/users"),
            Some(&Endpoint::new("users", "head_index"))
        );
        assert_eq!(table.lookup(&Method::HEAD, "/orders"), None);
        assert_eq!(table.lookup(&Method::POST, "/users/{id}"), None);
    }

    #[test]
    fn test_extend_from_config() {
        let mut table = EndpointTable::new();
        table.extend_from_config(&[
            EndpointRouteConfig {
                method: "get".into(),
                path: "/orders".into(),
                handler: "orders".into(),
                action: "index".into(),
            },
            EndpointRouteConfig {
                method: "NOT A METHOD".into(),
                path: "/orders".into(),
                handler: "orders".into(),
                action: "broken".into(),
            },
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(
            table.lookup(&Method::GET, "/orders"),
            Some(&Endpoint::new("orders", "index"))
        );
    }

    #[test]
    fn test_accessor_prefers_explicit_extension() {
        let table = EndpointTable::new();
        let mut parts = Request::builder().uri("/x").body(()).unwrap().into_parts().0;
        assert_eq!(table.endpoint(&parts), None);

        parts.extensions.insert(Endpoint::new("x", "y"));
        assert_eq!(table.endpoint(&parts), Some(Endpoint::new("x", "y")));
    }
}
