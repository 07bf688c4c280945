//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Assemble the version gate from config and the host's routes
//! - Wire up middleware (tracing, timeout, request ID, versioning)
//! - Mount the admin API and health endpoint
//! - Bind server to listener
//! - Apply registry reloads pushed by the config watcher

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{http::StatusCode, middleware::from_fn_with_state, routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{setup_admin_router, AdminState};
use crate::config::{build_registry, AppConfig, ConfigError};
use crate::http::middleware::{versioning_middleware, InvalidVersionHandler, VersioningState};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown::{self, Shutdown};
use crate::observability::metrics;
use crate::routing::{EndpointTable, UnversionedRoutes};
use crate::versioning::{ChangeCatalog, SharedRegistry, VersionGate};

/// Rebuilds the registry from reloaded config and publishes it.
#[derive(Clone)]
pub struct RegistryReloader {
    registry: SharedRegistry,
    catalog: ChangeCatalog,
}

impl RegistryReloader {
    /// Build and swap in a new registry. On error the current one stays.
    pub fn apply(&self, config: &AppConfig) -> Result<usize, ConfigError> {
        match build_registry(config, &self.catalog) {
            Ok(registry) => {
                let versions = registry.len();
                self.registry.replace(registry);
                metrics::record_config_reload(true);
                tracing::info!(versions, "Version registry reloaded");
                Ok(versions)
            }
            Err(e) => {
                metrics::record_config_reload(false);
                tracing::error!(error = %e, "Rejected registry reload; keeping current registry");
                Err(e)
            }
        }
    }

    /// Apply every config pushed on `updates` until the channel closes.
    pub async fn run(self, mut updates: mpsc::UnboundedReceiver<AppConfig>) {
        while let Some(config) = updates.recv().await {
            let _ = self.apply(&config);
        }
    }
}

/// HTTP server hosting a versioned API.
pub struct HttpServer {
    api: Router,
    config: AppConfig,
    registry: SharedRegistry,
    catalog: ChangeCatalog,
    versioning: VersioningState,
    started_at: Instant,
}

impl HttpServer {
    /// Create a server for the host's `api` routes.
    ///
    /// `endpoints` names the routes registered on `api`; `catalog` holds change
    /// units defined in code, next to the ones declared in config.
    pub fn new(
        config: AppConfig,
        api: Router,
        mut endpoints: EndpointTable,
        catalog: ChangeCatalog,
    ) -> Result<Self, ConfigError> {
        let registry = SharedRegistry::new(build_registry(&config, &catalog)?);
        endpoints.extend_from_config(&config.endpoints);

        tracing::info!(
            versions = registry.current().len(),
            endpoints = endpoints.len(),
            "Version registry built"
        );

        let gate = VersionGate::new(Arc::new(registry.clone()))
            .with_extractor(Arc::new(config.versioning.strategy.clone()))
            .with_bypass(Arc::new(UnversionedRoutes::from_config(&config.versioning)))
            .with_endpoints(Arc::new(endpoints))
            .with_default_version(config.versioning.default_version.clone());

        let versioning = VersioningState::new(gate)
            .with_max_body_bytes(config.versioning.max_body_bytes)
            .with_max_response_bytes(config.versioning.max_response_bytes);

        Ok(Self {
            api,
            config,
            registry,
            catalog,
            versioning,
            started_at: Instant::now(),
        })
    }

    /// Replace the response sent for unknown or missing versions.
    pub fn with_invalid_version_handler(mut self, handler: InvalidVersionHandler) -> Self {
        self.versioning = self.versioning.with_invalid_version_handler(handler);
        self
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        let api = self
            .api
            .clone()
            .route_layer(from_fn_with_state(self.versioning.clone(), versioning_middleware));

        let mut app = Router::new().route("/health", get(health)).merge(api);

        if self.config.admin.enabled {
            app = app.merge(setup_admin_router(AdminState {
                registry: self.registry.clone(),
                api_key: Arc::new(self.config.admin.api_key.clone()),
                versioning_enabled: self.config.versioning.enabled,
                started_at: self.started_at,
            }));
        }

        app.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(self.config.timeouts.request_secs),
        ))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Handle for applying config reloads to the live registry.
    pub fn reloader(&self) -> RegistryReloader {
        RegistryReloader {
            registry: self.registry.clone(),
            catalog: self.catalog.clone(),
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<AppConfig>,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reload_task = tokio::spawn(self.reloader().run(config_updates));
        let app = self.router();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown.subscribe()))
            .await?;

        reload_task.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
