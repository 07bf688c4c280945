//! API versioning server.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  VERSIONED API                   │
//!   Client Request       │  ┌─────────┐   ┌─────────┐   ┌───────────────┐   │
//!   ─────────────────────┼─▶│ request │──▶│ router  │──▶│  versioning   │   │
//!   (x-api-version: V)   │  │   id    │   │ (route) │   │  gate + req   │   │
//!                        │  └─────────┘   └─────────┘   │   pipeline    │   │
//!                        │                              └──────┬────────┘   │
//!                        │                                     ▼            │
//!                        │                              ┌───────────────┐   │
//!                        │                              │   handler     │   │
//!                        │                              │ (current API) │   │
//!                        │                              └──────┬────────┘   │
//!   Client Response      │                              ┌──────▼────────┐   │
//!   ◀────────────────────┼──────────────────────────────│   response    │   │
//!   (shape of V)         │                              │   pipeline    │   │
//!                        │                              └───────────────┘   │
//!                        │  ┌────────────────────────────────────────────┐  │
//!                        │  │ config + watcher │ observability │ admin   │  │
//!                        │  └────────────────────────────────────────────┘  │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use api_versioning::config::load_config;
use api_versioning::config::watcher::ConfigWatcher;
use api_versioning::lifecycle::signals::shutdown_on_signal;
use api_versioning::observability::{logging, metrics};
use api_versioning::{demo, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "api-versioning")]
#[command(about = "Versioned users API with request/response migrations", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "versioning.toml")]
    config: PathBuf,

    /// Do not watch the config file for changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(&args.config)?;
    logging::init_logging(&config.observability)?;

    tracing::info!("api-versioning v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        versions = config.versions.len(),
        changes = config.changes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address already validated by the loader.
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let (api, endpoints) = demo::routes();
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, api, endpoints, demo::catalog()?)?;

    let (watcher, config_updates) = ConfigWatcher::new(&args.config);
    let _watcher = if args.no_watch {
        None
    } else {
        Some(watcher.run()?)
    };

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    server.run(listener, config_updates, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
