//! Fleet agent entry point.
//!
//! Initialises tracing, loads configuration from environment variables
//! (prefixed with `FLEET_AGENT_`) and serves the lifecycle endpoint.

use std::sync::Arc;

use anyhow::{Context, Result};
use fleet_agent::routes::{AppState, router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialise tracing with RUST_LOG env filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("fleet-agent starting");

    // 2. Load configuration from FLEET_AGENT_* env vars; every field has a default.
    let config = fleet_agent::config::load(std::env::vars())
        .context("failed to load config from FLEET_AGENT_* env vars")?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        short_timeout_secs = config.short_timeout_secs,
        long_timeout_secs = config.long_timeout_secs,
        service = %config.service_name,
        "configuration loaded",
    );

    // 3. Build the router over a single shared runner.
    let state = Arc::new(AppState::from_config(&config));
    let app = router(state);

    // 4. Bind and serve until Ctrl-C.
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    tracing::info!("agent ready at http://{}/v1/lifecycle", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("fleet-agent shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) for graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
