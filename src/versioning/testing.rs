//! Test doubles shared by the versioning unit tests.

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use crate::versioning::change::{Change, Endpoint, Params, TransformError};

/// Shared call log: one entry per transform invocation, e.g. `"A:body"`.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Appends its id to a `trail` array in every namespace and in the response,
/// and records each invocation in the call log.
#[derive(Debug)]
pub struct Recorder {
    id: String,
    routes: Vec<Endpoint>,
    log: CallLog,
}

impl Recorder {
    pub fn new(id: &str, routes: Vec<Endpoint>, log: &CallLog) -> Arc<dyn Change> {
        Arc::new(Self {
            id: id.to_string(),
            routes,
            log: log.clone(),
        })
    }

    fn record(&self, what: &str) {
        self.log.lock().unwrap().push(format!("{}:{}", self.id, what));
    }

    fn stamp(&self, mut params: Params) -> Params {
        let trail = params
            .entry("trail")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = trail {
            items.push(json!(self.id));
        }
        params
    }
}

impl Change for Recorder {
    fn id(&self) -> &str {
        &self.id
    }

    fn routes(&self) -> &[Endpoint] {
        &self.routes
    }

    fn transform_request_body(&self, params: Params, _: &Endpoint) -> Result<Params, TransformError> {
        self.record("body");
        Ok(self.stamp(params))
    }

    fn transform_request_query(&self, params: Params, _: &Endpoint) -> Result<Params, TransformError> {
        self.record("query");
        Ok(self.stamp(params))
    }

    fn transform_request_path(&self, params: Params, _: &Endpoint) -> Result<Params, TransformError> {
        self.record("path");
        Ok(self.stamp(params))
    }

    fn transform_response(&self, mut payload: Value, _: &Endpoint) -> Result<Value, TransformError> {
        self.record("response");
        if let Some(object) = payload.as_object_mut() {
            let trail = object
                .entry("trail")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = trail {
                items.push(json!(self.id));
            }
        }
        Ok(payload)
    }
}

/// Fails every request body transform.
#[derive(Debug)]
pub struct Failing {
    pub routes: Vec<Endpoint>,
}

impl Change for Failing {
    fn id(&self) -> &str {
        "failing"
    }

    fn routes(&self) -> &[Endpoint] {
        &self.routes
    }

    fn transform_request_body(&self, _: Params, endpoint: &Endpoint) -> Result<Params, TransformError> {
        Err(TransformError::Unsupported {
            change: "failing".into(),
            endpoint: endpoint.clone(),
            reason: "always fails".into(),
        })
    }
}

pub fn ids(chain: &[Arc<dyn Change>]) -> Vec<&str> {
    chain.iter().map(|change| change.id()).collect()
}
