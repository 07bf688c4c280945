//! Closure-backed change units keyed by endpoint.
//!
//! Lets a host register a change in code without writing a type:
//!
//! ```
//! use api_versioning::versioning::{Endpoint, MappedChange};
//!
//! let show = Endpoint::new("users", "show");
//! let change = MappedChange::new("users-drop-legacy-flag")
//!     .on_response(show, |mut payload| {
//!         if let Some(object) = payload.as_object_mut() {
//!             object.insert("legacy".into(), true.into());
//!         }
//!         Ok(payload)
//!     });
//! # let _ = change;
//! ```
//!
//! An endpoint with no registered closure for a direction is passed through.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::versioning::change::{Change, Endpoint, Params, TransformError};

type ParamsFn = Box<dyn Fn(Params) -> Result<Params, TransformError> + Send + Sync>;
type PayloadFn = Box<dyn Fn(Value) -> Result<Value, TransformError> + Send + Sync>;

#[derive(Default)]
struct Handlers {
    body: Option<ParamsFn>,
    query: Option<ParamsFn>,
    path: Option<ParamsFn>,
    response: Option<PayloadFn>,
}

pub struct MappedChange {
    id: String,
    description: String,
    routes: Vec<Endpoint>,
    handlers: HashMap<Endpoint, Handlers>,
}

impl fmt::Debug for MappedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedChange")
            .field("id", &self.id)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

impl MappedChange {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            routes: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn handlers_for(&mut self, endpoint: Endpoint) -> &mut Handlers {
        if !self.routes.contains(&endpoint) {
            self.routes.push(endpoint.clone());
        }
        self.handlers.entry(endpoint).or_default()
    }

    pub fn on_request_body<F>(mut self, endpoint: Endpoint, f: F) -> Self
    where
        F: Fn(Params) -> Result<Params, TransformError> + Send + Sync + 'static,
    {
        self.handlers_for(endpoint).body = Some(Box::new(f));
        self
    }

    pub fn on_request_query<F>(mut self, endpoint: Endpoint, f: F) -> Self
    where
        F: Fn(Params) -> Result<Params, TransformError> + Send + Sync + 'static,
    {
        self.handlers_for(endpoint).query = Some(Box::new(f));
        self
    }

    pub fn on_request_path<F>(mut self, endpoint: Endpoint, f: F) -> Self
    where
        F: Fn(Params) -> Result<Params, TransformError> + Send + Sync + 'static,
    {
        self.handlers_for(endpoint).path = Some(Box::new(f));
        self
    }

    pub fn on_response<F>(mut self, endpoint: Endpoint, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        self.handlers_for(endpoint).response = Some(Box::new(f));
        self
    }

    fn run_params(
        &self,
        endpoint: &Endpoint,
        pick: impl Fn(&Handlers) -> Option<&ParamsFn>,
        params: Params,
    ) -> Result<Params, TransformError> {
        match self.handlers.get(endpoint).and_then(pick) {
            Some(f) => f(params),
            None => Ok(params),
        }
    }
}

impl Change for MappedChange {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn routes(&self) -> &[Endpoint] {
        &self.routes
    }

    fn transform_request_body(&self, params: Params, endpoint: &Endpoint) -> Result<Params, TransformError> {
        self.run_params(endpoint, |h| h.body.as_ref(), params)
    }

    fn transform_request_query(&self, params: Params, endpoint: &Endpoint) -> Result<Params, TransformError> {
        self.run_params(endpoint, |h| h.query.as_ref(), params)
    }

    fn transform_request_path(&self, params: Params, endpoint: &Endpoint) -> Result<Params, TransformError> {
        self.run_params(endpoint, |h| h.path.as_ref(), params)
    }

    fn transform_response(&self, payload: Value, endpoint: &Endpoint) -> Result<Value, TransformError> {
        match self.handlers.get(endpoint).and_then(|h| h.response.as_ref()) {
            Some(f) => f(payload),
            None => Ok(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dispatches_by_endpoint() {
        let show = Endpoint::new("users", "show");
        let index = Endpoint::new("users", "index");
        let change = MappedChange::new("m")
            .on_request_query(index.clone(), |mut q| {
                if let Some(limit) = q.remove("limit") {
                    q.insert("per_page".into(), limit);
                }
                Ok(q)
            })
            .on_response(show.clone(), |_| Ok(json!("shown")));

        assert_eq!(change.routes(), &[index.clone(), show.clone()]);

        let mut query = Params::new();
        query.insert("limit".into(), json!("5"));
        let out = change.transform_request_query(query.clone(), &index).unwrap();
        assert_eq!(Value::Object(out), json!({"per_page": "5"}));

        // No query handler for `show`: identity.
        assert_eq!(change.transform_request_query(query.clone(), &show).unwrap(), query);
        assert_eq!(change.transform_response(json!(1), &show).unwrap(), json!("shown"));
        assert_eq!(change.transform_response(json!(1), &index).unwrap(), json!(1));
    }

    #[test]
    fn test_route_registered_once() {
        let show = Endpoint::new("users", "show");
        let change = MappedChange::new("m")
            .on_request_body(show.clone(), Ok)
            .on_request_path(show.clone(), Ok)
            .describe("twice");

        assert_eq!(change.routes().len(), 1);
        assert_eq!(change.description(), "twice");
    }
}
