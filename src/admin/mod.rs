//! Admin API: read-only view of the live version registry.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::versioning::SharedRegistry;

#[derive(Clone)]
pub struct AdminState {
    pub registry: SharedRegistry,
    pub api_key: Arc<String>,
    pub versioning_enabled: bool,
    pub started_at: Instant,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/versions", get(get_versions))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
