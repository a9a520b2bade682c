//! Adrev Server - Main entry point

use anyhow::Result;
use axum::{routing::get, Json, Router};
use adrev_common::logging::{init_logging, LogConfig};
use serde_json::{json, Value};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;

use adrev_server::{
    config::Config,
    features::{self, FeatureState},
    ingest::{FeedRunner, IngestConfig, RunQueue},
    middleware,
    secrets::EnvSecretStore,
};

const MAX_DRAIN_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("adrev-server")
        .filter_directives("adrev_server=debug,tower_http=debug,tiberius=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting Adrev Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let ingest_config = IngestConfig::from_env()?;
    let runner =
        FeedRunner::connect(ingest_config, &config.database.secret_name, &EnvSecretStore).await?;
    info!(feeds = ?runner.available_feeds(), "Feed runner ready");

    let (queue, worker) = RunQueue::new(config.queue.capacity);
    let _worker_handle = worker.start(Arc::new(runner));

    let app = create_router(FeatureState { queue });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_router(state: FeatureState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", features::router(state))
        .layer(middleware::tracing_layer())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // An in-flight feed run is not cancelled; it is dropped with the runtime
    let drain = drain_delay(timeout_secs);
    info!(
        "Waiting {} seconds for connections to close (configured {})",
        drain.as_secs(),
        timeout_secs
    );
    tokio::time::sleep(drain).await;
}

/// Pause before shutdown, capped at [`MAX_DRAIN_SECS`]
fn drain_delay(timeout_secs: u64) -> Duration {
    Duration::from_secs(timeout_secs.min(MAX_DRAIN_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_delay_is_capped() {
        assert_eq!(drain_delay(30), Duration::from_secs(5));
        assert_eq!(drain_delay(2), Duration::from_secs(2));
        assert_eq!(drain_delay(0), Duration::ZERO);
    }
}
