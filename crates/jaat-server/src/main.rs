//! HTTP server entry point.
//!
//! Reads configuration from the environment (and `.env`), builds the shared
//! state once, and serves the router until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};
use jaat_config::ServerConfig;
use jaat_server::{app, ServerState};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;

    match config.has_credential() {
        true => info!("OpenAI API key configured (model: {})", config.model),
        false => warn!("OPENAI_API_KEY is not set; chat requests will receive a fallback response"),
    }

    let state = ServerState::from_config(config).context("failed to initialize server state")?;

    info!("Loaded {} features ({} modes)", state.features.list().len(), state.features.modes().count());
    for root in state.assets.roots() {
        info!("  - serving assets from {}", root.display());
    }

    let addr = state.config.addr();
    let router = app(Arc::new(state));

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
