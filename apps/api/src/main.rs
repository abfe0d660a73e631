mod config;
mod errors;
mod export;
mod extraction;
mod generation;
mod llm_client;
mod models;
mod pages;
mod retention;
mod routes;
mod session;
mod state;
mod uploads;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::retention::RetentionWorker;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Writing Assistant v{}", env!("CARGO_PKG_VERSION"));

    tokio::fs::create_dir_all(&config.upload_folder)
        .await
        .with_context(|| format!("creating upload folder {}", config.upload_folder.display()))?;
    info!("Upload folder: {}", config.upload_folder.display());

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), &config.anthropic_api_url)?;
    info!(
        "LLM client initialized (model: {}, max_tokens: {})",
        config.claude_model, config.max_tokens
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid HOST/PORT")?;

    // Build app state
    let state = AppState::new(config, Arc::new(llm));

    // Start retention worker
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = RetentionWorker::new(&state, shutdown_rx);
    tokio::spawn(worker.run());

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the UI is served from a fixed domain

    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
            }
            let _ = shutdown_tx.send(true);
        })
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}
