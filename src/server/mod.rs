//! HTTP(S) server for the conversion webhook
//!
//! - `/convert` - ConversionReview webhook (v1beta1 <-> v2)
//! - `/healthz`, `/readyz` - Kubernetes probes
//! - `/metrics` - Prometheus metrics
//!
//! Also provides TLS bootstrap and graceful shutdown handling.

mod health;
pub mod http;
pub mod metrics;
pub mod shutdown;
pub mod tls;
pub mod webhook;

pub use health::ReadinessState;
pub use http::{build_router, run_webhook_server, run_webhook_server_tls, ServerState};
pub use metrics::{create_metrics, SharedMetrics};
pub use shutdown::{shutdown_channel, wait_for_signal, ShutdownController, ShutdownSignal};
pub use tls::{build_rustls_config, initialize_tls};

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod shutdown_tests;
