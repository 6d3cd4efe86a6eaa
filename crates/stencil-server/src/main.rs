//! # stencil-server
//!
//! Reference backend for the Stencil template pipeline: REST API, on-disk
//! media store and the conversion worker.

use std::sync::Arc;

use stencil_server::api;
use stencil_server::config::ServerConfig;
use stencil_server::convert::ScaffoldConverter;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,stencil_server=debug")),
        )
        .init();

    info!("Starting Stencil server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");
    let http_addr = config.http_addr;

    // -----------------------------------------------------------------------
    // 3. Open storage and start the worker
    // -----------------------------------------------------------------------
    let (app_state, worker) =
        stencil_server::bootstrap(config, Arc::new(ScaffoldConverter)).await?;
    let worker_task = worker.spawn();

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                worker_task.abort();
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    worker_task.abort();
    Ok(())
}
