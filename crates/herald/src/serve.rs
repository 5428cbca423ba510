// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `herald serve` command implementation.
//!
//! Initializes tracing, discovers and loads plugins from the configured
//! directory, then serves the admin API until a shutdown signal arrives.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use herald_config::HeraldConfig;
use herald_core::HeraldError;
use herald_gateway::server::start_server;
use herald_plugin::Manager;

/// Runs the `herald serve` command.
pub async fn run_serve(config: HeraldConfig) -> Result<(), HeraldError> {
    init_tracing(&config.log.level);

    info!("starting herald serve");

    let manager = Arc::new(Manager::new(&config.plugins.dir));
    let stats = manager.load_all().await;
    if stats.failed > 0 {
        warn!(
            attempted = stats.attempted,
            loaded = stats.loaded,
            failed = stats.failed,
            "plugin discovery finished with failures"
        );
    } else {
        info!(
            attempted = stats.attempted,
            loaded = stats.loaded,
            "plugin discovery finished"
        );
    }

    let cancel = install_signal_handler();

    start_server(
        manager,
        &config.server.host,
        config.server.port,
        cancel.cancelled_owned(),
    )
    .await?;

    info!("herald serve shutdown complete");
    Ok(())
}

/// Installs SIGINT/SIGTERM handlers that cancel the returned token.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("herald={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
