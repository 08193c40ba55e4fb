//! Main entry point for the quorum status server.
//!
//! Starts the store health monitor and serves its status over HTTP until
//! Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use quorum_health::HealthMonitor;
use quorum_server::{
    config::{Cli, ServerConfig},
    startup::{self, LoggingConfig, ShutdownSignal},
};
use tracing::{info, warn};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::load(&cli).context("failed to load configuration")?;

    let logging_config = LoggingConfig::from_settings(&config.logging).with_env_overrides();
    let _logging_guard = startup::init_logging(&logging_config)?;

    info!(
        endpoints = ?config.health.endpoints,
        tls = config.health.is_tls_enabled(),
        policy = ?config.health.policy,
        listen = %config.http.listen,
        "Starting quorum status server"
    );

    let monitor = Arc::new(
        HealthMonitor::start(config.health.clone(), config.root.clone())
            .await
            .context("failed to start store health monitor")?,
    );

    let shutdown = ShutdownSignal::new();
    startup::listen_for_os_signals(shutdown.clone());

    let server = startup::status_server(monitor.clone(), &config.http)
        .with_context(|| format!("failed to bind status server on {}", config.http.listen))?;
    let handle = server.handle();

    match startup::run_with_shutdown(server, &shutdown).await {
        Some(result) => result.context("status server failed")?,
        None => {
            info!("Stopping status server");
            handle.stop(true).await;
        }
    }

    let timeout = config.http.shutdown_timeout();
    if tokio::time::timeout(timeout, monitor.shutdown()).await.is_err() {
        warn!(timeout = ?timeout, "Health monitor did not stop in time");
    }

    info!("Shutdown complete");
    Ok(())
}
