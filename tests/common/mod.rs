//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, Response};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use api_versioning::config::parse_config;
use api_versioning::{demo, AppConfig, HttpServer, Shutdown};

/// The sample config shipped at the repository root.
pub const SAMPLE_CONFIG: &str = include_str!("../../versioning.toml");

pub const API_KEY: &str = "test-admin-key";

pub fn sample_config() -> AppConfig {
    parse_config(SAMPLE_CONFIG).unwrap()
}

/// Sample config with the admin API switched on.
pub fn admin_config() -> AppConfig {
    let mut config = sample_config();
    config.admin.enabled = true;
    config.admin.api_key = API_KEY.to_string();
    config
}

/// The bundled users API behind a version gate built from `config`.
pub fn demo_server(config: AppConfig) -> HttpServer {
    let (api, endpoints) = demo::routes();
    HttpServer::new(config, api, endpoints, demo::catalog().unwrap()).unwrap()
}

/// Build a request, optionally pinned to a version and carrying a JSON body.
pub fn request(method: Method, uri: &str, version: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(version) = version {
        builder = builder.header("x-api-version", version);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<AppConfig>,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

pub async fn start_server(config: AppConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = demo_server(config);

    let (config_updates, rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, rx, shutdown.clone()));

    TestServer {
        addr,
        shutdown,
        config_updates,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
