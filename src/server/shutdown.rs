//! Graceful shutdown for the conversion webhook
//!
//! `wait_for_signal` resolves on SIGTERM/SIGINT. The main task then fires the
//! `ShutdownController`, and every server holding a `ShutdownSignal` stops
//! accepting connections and drains the ones in flight.

use tokio::sync::watch;
use tracing::{error, info};

/// Receiving side of the shutdown channel, cheap to clone
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once shutdown is triggered or the controller is dropped
    pub async fn wait(&mut self) {
        // wait_for returns Err only when the sender is gone, which also means shutdown
        let _ = self.receiver.wait_for(|triggered| *triggered).await;
    }

    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Sending side of the shutdown channel
pub struct ShutdownController {
    sender: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
        info!("Shutdown signal sent");
    }
}

/// Create a new (controller, signal) pair
pub fn shutdown_channel() -> (ShutdownController, ShutdownSignal) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownController { sender }, ShutdownSignal { receiver })
}

/// Wait for SIGTERM or SIGINT and return the signal name
///
/// If a handler cannot be registered the error is logged and the other
/// signal is still awaited; with neither available this never resolves.
#[cfg(unix)]
pub async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| error!(error = %e, "Failed to register SIGTERM handler"))
        .ok();
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| error!(error = %e, "Failed to register SIGINT handler"))
        .ok();

    let terminate = async {
        match sigterm.as_mut() {
            Some(s) => {
                s.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };
    let interrupt = async {
        match sigint.as_mut() {
            Some(s) => {
                s.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = terminate => {
            info!("Received SIGTERM");
            "SIGTERM"
        }
        _ = interrupt => {
            info!("Received SIGINT");
            "SIGINT"
        }
    }
}

/// Wait for Ctrl+C (non-unix)
#[cfg(not(unix))]
pub async fn wait_for_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to wait for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C");
    "CTRL_C"
}
