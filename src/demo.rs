//! Sample versioned API served by the binary.
//!
//! Current shape (`2024-06-01`):
//! - `GET  /users`      → `{"users": [...], "order": "..."}`
//! - `GET  /users/{id}` → `{"id", "full_name", "email", "role"}`
//! - `POST /users`      → echoes the created user, `role` falls back to `guest`
//!
//! Declarative changes live in `versioning.toml`; the envelope change below
//! needs code because it reshapes the whole payload.

use std::sync::Arc;

use axum::{
    http::{Method, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::http::{ApiVersion, HttpError};
use crate::routing::EndpointTable;
use crate::versioning::{ChangeCatalog, Endpoint, MappedChange, RegistryError, RequestParams};

pub fn users_index() -> Endpoint {
    Endpoint::new("users", "index")
}

pub fn users_show() -> Endpoint {
    Endpoint::new("users", "show")
}

pub fn users_create() -> Endpoint {
    Endpoint::new("users", "create")
}

/// The host routes plus the endpoint identity of each.
pub fn routes() -> (Router, EndpointTable) {
    let router = Router::new()
        .route("/users", get(index).post(create))
        .route("/users/{id}", get(show));

    let endpoints = EndpointTable::new()
        .with(Method::GET, "/users", users_index())
        .with(Method::POST, "/users", users_create())
        .with(Method::GET, "/users/{id}", users_show());

    (router, endpoints)
}

/// Change units defined in code.
pub fn catalog() -> Result<ChangeCatalog, RegistryError> {
    let mut catalog = ChangeCatalog::new();
    catalog.register(Arc::new(users_envelope()))?;
    Ok(catalog)
}

/// `GET /users` used to return a bare array.
fn users_envelope() -> MappedChange {
    MappedChange::new("users-index-envelope")
        .describe("GET /users wraps the list in {\"users\": [...]}")
        .on_response(users_index(), |mut payload| {
            Ok(match payload.get_mut("users").map(Value::take) {
                Some(users) => users,
                None => payload,
            })
        })
}

fn param(params: &RequestParams, key: &str) -> Option<String> {
    params.get(key).map(|value| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn user(id: &str, full_name: &str) -> Value {
    json!({
        "id": id,
        "full_name": full_name,
        "email": format!("user{}@example.com", id),
        "role": "member",
    })
}

async fn index(params: RequestParams, version: Option<axum::Extension<ApiVersion>>) -> Json<Value> {
    let order = param(&params, "order").unwrap_or_else(|| "id".to_string());
    tracing::debug!(version = ?version.map(|v| v.0 .0), order = %order, "Listing users");

    let mut users = vec![user("1", "Grace Hopper"), user("2", "Ada Lovelace")];
    if order == "full_name" {
        users.sort_by(|a, b| a["full_name"].as_str().cmp(&b["full_name"].as_str()));
    }

    Json(json!({ "users": users, "order": order }))
}

async fn show(params: RequestParams) -> Result<Json<Value>, HttpError> {
    let id = param(&params, "id").ok_or(HttpError::MissingParams)?;
    Ok(Json(user(&id, "Ada Lovelace")))
}

async fn create(params: RequestParams) -> (StatusCode, Json<Value>) {
    let full_name = param(&params, "full_name").unwrap_or_default();
    let mut created = user("3", &full_name);
    created["role"] = Value::String(param(&params, "role").unwrap_or_else(|| "guest".to_string()));
    (StatusCode::CREATED, Json(created))
}
