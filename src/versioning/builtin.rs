//! Declarative change units, configurable from TOML.
//!
//! # Kinds
//! - `rename_field`: legacy clients send/expect `legacy`, current code uses `current`
//! - `default_value`: legacy clients omit a field the current code requires
//! - `hide_field`: current code emits a field legacy clients must not see
//!
//! Response rewriting applies to a top-level object, or to every object of a
//! top-level array. Any other payload passes through untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::versioning::change::{Change, Endpoint, Params, TransformError};

/// Which request namespace a change rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLocation {
    #[default]
    Body,
    Query,
    Path,
}

/// Identity shared by every built-in change.
#[derive(Debug, Clone)]
pub struct ChangeMeta {
    pub id: String,
    pub description: String,
    pub routes: Vec<Endpoint>,
}

impl ChangeMeta {
    pub fn new(id: impl Into<String>, routes: Vec<Endpoint>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            routes,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

fn for_each_object(payload: &mut Value, mut f: impl FnMut(&mut Params)) {
    match payload {
        Value::Object(object) => f(object),
        Value::Array(items) => {
            for item in items.iter_mut() {
                if let Value::Object(object) = item {
                    f(object);
                }
            }
        }
        _ => {}
    }
}

/// Renames a field between its legacy and current name.
#[derive(Debug, Clone)]
pub struct RenameField {
    meta: ChangeMeta,
    location: ParamLocation,
    legacy: String,
    current: String,
}

impl RenameField {
    pub fn new(
        meta: ChangeMeta,
        location: ParamLocation,
        legacy: impl Into<String>,
        current: impl Into<String>,
    ) -> Self {
        Self {
            meta,
            location,
            legacy: legacy.into(),
            current: current.into(),
        }
    }

    fn upgrade(&self, mut params: Params) -> Result<Params, TransformError> {
        let Some(value) = params.remove(&self.legacy) else {
            return Ok(params);
        };

        match params.get(&self.current) {
            Some(existing) if existing != &value => Err(TransformError::Conflict {
                change: self.meta.id.clone(),
                legacy: self.legacy.clone(),
                current: self.current.clone(),
            }),
            _ => {
                params.insert(self.current.clone(), value);
                Ok(params)
            }
        }
    }

    fn rewrite(&self, location: ParamLocation, params: Params) -> Result<Params, TransformError> {
        if location == self.location {
            self.upgrade(params)
        } else {
            Ok(params)
        }
    }
}

impl Change for RenameField {
    fn id(&self) -> &str {
        &self.meta.id
    }

    fn description(&self) -> &str {
        &self.meta.description
    }

    fn routes(&self) -> &[Endpoint] {
        &self.meta.routes
    }

    fn transform_request_body(&self, params: Params, _: &Endpoint) -> Result<Params, TransformError> {
        self.rewrite(ParamLocation::Body, params)
    }

    fn transform_request_query(&self, params: Params, _: &Endpoint) -> Result<Params, TransformError> {
        self.rewrite(ParamLocation::Query, params)
    }

    fn transform_request_path(&self, params: Params, _: &Endpoint) -> Result<Params, TransformError> {
        self.rewrite(ParamLocation::Path, params)
    }

    fn transform_response(&self, mut payload: Value, _: &Endpoint) -> Result<Value, TransformError> {
        for_each_object(&mut payload, |object| {
            if let Some(value) = object.remove(&self.current) {
                object.insert(self.legacy.clone(), value);
            }
        });
        Ok(payload)
    }
}

/// Supplies a value for a field legacy clients never send.
#[derive(Debug, Clone)]
pub struct DefaultValue {
    meta: ChangeMeta,
    location: ParamLocation,
    field: String,
    value: Value,
}

impl DefaultValue {
    pub fn new(meta: ChangeMeta, location: ParamLocation, field: impl Into<String>, value: Value) -> Self {
        Self {
            meta,
            location,
            field: field.into(),
            value,
        }
    }

    fn fill(&self, location: ParamLocation, mut params: Params) -> Params {
        if location == self.location && !params.contains_key(&self.field) {
            params.insert(self.field.clone(), self.value.clone());
        }
        params
    }
}

impl Change for DefaultValue {
    fn id(&self) -> &str {
        &self.meta.id
    }

    fn description(&self) -> &str {
        &self.meta.description
    }

    fn routes(&self) -> &[Endpoint] {
        &self.meta.routes
    }

    fn transform_request_body(&self, params: Params, _: &Endpoint) -> Result<Params, TransformError> {
        Ok(self.fill(ParamLocation::Body, params))
    }

    fn transform_request_query(&self, params: Params, _: &Endpoint) -> Result<Params, TransformError> {
        Ok(self.fill(ParamLocation::Query, params))
    }

    fn transform_request_path(&self, params: Params, _: &Endpoint) -> Result<Params, TransformError> {
        Ok(self.fill(ParamLocation::Path, params))
    }
}

/// Removes a response field introduced after the client's version.
#[derive(Debug, Clone)]
pub struct HideField {
    meta: ChangeMeta,
    field: String,
}

impl HideField {
    pub fn new(meta: ChangeMeta, field: impl Into<String>) -> Self {
        Self {
            meta,
            field: field.into(),
        }
    }
}

impl Change for HideField {
    fn id(&self) -> &str {
        &self.meta.id
    }

    fn description(&self) -> &str {
        &self.meta.description
    }

    fn routes(&self) -> &[Endpoint] {
        &self.meta.routes
    }

    fn transform_response(&self, mut payload: Value, _: &Endpoint) -> Result<Value, TransformError> {
        for_each_object(&mut payload, |object| {
            object.remove(&self.field);
        });
        Ok(payload)
    }
}
