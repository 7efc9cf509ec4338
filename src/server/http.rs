//! HTTP(S) server hosting the conversion webhook and health endpoints
//!
//! Both variants serve the same router, mark the readiness state once the
//! listener is bound, and stop accepting connections when the shutdown
//! signal fires, letting in-flight requests finish.

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

use crate::server::health::{self, ReadinessState};
use crate::server::metrics::SharedMetrics;
use crate::server::shutdown::ShutdownSignal;
use crate::server::webhook;

/// How long in-flight requests get to finish once shutdown starts (HTTPS)
pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// State shared by every handler
#[derive(Clone)]
pub struct ServerState {
    pub(crate) readiness: ReadinessState,
    pub(crate) metrics: SharedMetrics,
}

impl ServerState {
    pub fn new(readiness: ReadinessState, metrics: SharedMetrics) -> Self {
        Self { readiness, metrics }
    }
}

/// Build the router for health, metrics, and webhook endpoints
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .route("/convert", post(webhook::handle_convert))
        .with_state(state)
}

/// Run the webhook server over plain HTTP
///
/// Returns an error if the port cannot be bound, otherwise once `shutdown`
/// fires and open connections have drained.
pub async fn run_webhook_server(
    port: u16,
    state: ServerState,
    mut shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    let readiness = state.readiness.clone();
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    // Log after successful bind - server is actually listening
    info!(port = %port, "Conversion webhook listening (HTTP)");
    readiness.set_ready();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
}

/// Run the webhook server over HTTPS
///
/// This is what the API server calls; it requires TLS.
pub async fn run_webhook_server_tls(
    port: u16,
    state: ServerState,
    tls_config: Arc<rustls::ServerConfig>,
    mut shutdown: ShutdownSignal,
) -> Result<(), std::io::Error> {
    use axum_server::tls_rustls::RustlsConfig;
    use axum_server::Handle;

    let readiness = state.readiness.clone();
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let config = RustlsConfig::from_config(tls_config);

    let handle = Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        shutdown.wait().await;
        shutdown_handle.graceful_shutdown(Some(GRACEFUL_SHUTDOWN_TIMEOUT));
    });

    // listening() resolves to None if the bind fails
    let listening_handle = handle.clone();
    tokio::spawn(async move {
        if let Some(addr) = listening_handle.listening().await {
            info!(port = %addr.port(), "Conversion webhook listening (HTTPS)");
            readiness.set_ready();
        }
    });

    axum_server::bind_rustls(addr, config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
