// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin HTTP server built on axum.

use std::future::Future;
use std::sync::Arc;

use tracing::info;

use herald_core::HeraldError;
use herald_plugin::Manager;

use crate::admin_router;

/// Bind and serve the admin API until `shutdown` resolves.
///
/// In-flight requests drain before the future completes.
pub async fn start_server(
    manager: Arc<Manager>,
    host: &str,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), HeraldError> {
    let app = admin_router(manager);

    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .map_err(|e| HeraldError::Internal(format!("failed to bind {host}:{port}: {e}")))?;

    let local = listener
        .local_addr()
        .map_err(|e| HeraldError::Internal(format!("failed to read bound address: {e}")))?;
    info!(addr = %local, "admin api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| HeraldError::Internal(format!("admin server error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn server_binds_and_shuts_down() {
        let manager = Arc::new(Manager::new("/nonexistent"));
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(start_server(manager, "127.0.0.1", 0, async {
            let _ = rx.await;
        }));

        // Give the listener a moment to come up, then stop it.
        tokio::task::yield_now().await;
        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn bind_failure_surfaces_as_internal_error() {
        let manager = Arc::new(Manager::new("/nonexistent"));
        let err = start_server(manager, "256.0.0.1", 0, async {})
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to bind"));
    }
}
