//! Dossier Server - Main entry point

use anyhow::{Context, Result};
use dossier_common::logging::{init_logging, LogConfig};
use dossier_engine::{catalog, EngineConfig};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tracing::info;

use dossier_server::{config::Config, create_router, features::FeatureState};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("dossier-server")
        .filter_directives("dossier_server=debug,dossier_engine=info,tower_http=debug")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;
    let _guard = init_logging(&log_config)?;

    info!("Starting dossier server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let engine_config = EngineConfig::load().context("Failed to load engine configuration")?;
    let orchestrator = catalog::default_orchestrator(&engine_config)?;
    info!(
        workflows = orchestrator.len(),
        "Workflows registered"
    );

    let app = create_router(FeatureState::new(orchestrator), &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM, then give in-flight runs a short grace period
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

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
