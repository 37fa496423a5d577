//! Graceful shutdown for the canary console
//!
//! SIGTERM or Ctrl+C moves the drain controller to Draining. Readiness then
//! fails, new requests are refused, and the server is stopped once in-flight
//! requests finish or the graceful timeout elapses, whichever comes first.

use std::sync::Arc;
use std::time::Duration;

use canary_core::DrainController;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Latched shutdown notification
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Get a receiver for shutdown notifications
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }

    /// Trigger shutdown
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once shutdown has been triggered, including before this call.
    pub async fn wait(&self) {
        let mut receiver = self.subscribe();
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Listen for Ctrl+C and SIGTERM in the background.
///
/// The first signal starts the drain with reason `signal:SIGINT` or
/// `signal:SIGTERM` and then fires the returned shutdown signal.
pub fn wait_for_shutdown_signal(drain: Arc<DrainController>) -> ShutdownSignal {
    let shutdown = ShutdownSignal::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        let reason = tokio::select! {
            _ = ctrl_c => "signal:SIGINT",
            _ = terminate => "signal:SIGTERM",
        };

        info!(reason = reason, "Received shutdown signal, draining");
        drain.trigger_drain(reason);
        shutdown_clone.shutdown();
    });

    shutdown
}

/// Graceful shutdown coordinator
///
/// Waits for the shutdown signal, then for in-flight requests to finish,
/// bounded by the graceful timeout.
pub struct GracefulShutdown {
    drain: Arc<DrainController>,
    shutdown_signal: ShutdownSignal,
    shutdown_timeout: Duration,
}

impl GracefulShutdown {
    pub fn new(
        drain: Arc<DrainController>,
        shutdown_signal: ShutdownSignal,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            drain,
            shutdown_signal,
            shutdown_timeout,
        }
    }

    /// Wait for shutdown and the drain to settle.
    ///
    /// Returns `true` when every in-flight request completed within the timeout.
    pub async fn wait_for_shutdown(&self) -> bool {
        self.shutdown_signal.wait().await;

        info!(
            in_flight = self.drain.in_flight(),
            "Shutdown initiated, waiting up to {:?} for in-flight requests...",
            self.shutdown_timeout
        );

        match tokio::time::timeout(self.shutdown_timeout, self.drain.wait_idle()).await {
            Ok(()) => {
                info!("All in-flight requests completed");
                true
            }
            Err(_) => {
                warn!(
                    in_flight = self.drain.in_flight(),
                    "Graceful timeout elapsed with requests still in flight"
                );
                false
            }
        }
    }

    pub fn signal(&self) -> ShutdownSignal {
        self.shutdown_signal.clone()
    }
}
