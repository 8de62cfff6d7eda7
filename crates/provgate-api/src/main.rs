//! # provgate: Binary Entry Point
//!
//! Parses flags, checks the data directory, then serves the upload API.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use provgate_api::config::Cli;
use provgate_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = cli.pipeline_config().map_err(|e| {
        tracing::error!("Startup failed: {e}");
        e
    })?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        appid = %config.expected_app_id,
        max_upload_bytes = ?config.max_upload_bytes,
        debug = config.debug,
        "configuration loaded"
    );
    if config.expected_app_id.is_empty() {
        tracing::warn!("no --appid configured; only manifests with an empty identifier will pass");
    }

    let request_timeout = cli.request_timeout();
    tracing::info!(request_timeout = ?request_timeout, "request body idle timeout");
    let app = provgate_api::app(AppState::new(config).with_request_timeout(request_timeout));

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("bind {}", cli.listen))?;
    tracing::info!("provgate listening on {}", cli.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
