//! Relay server: accept loop and per-connection task spawning.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::RelayConfig;
use crate::http::client::TargetClient;
use crate::http::dispatcher::Dispatcher;
use crate::net::{ConnectionContext, ConnectionHandler, ConnectionTracker, Listener, ListenerError};
use crate::resilience::AcceptBackoff;

/// TCP-to-HTTP relay.
///
/// Configuration is fixed at construction and shared read-only with every
/// connection task.
pub struct RelayServer {
    config: RelayConfig,
    handler: Arc<ConnectionHandler>,
    tracker: ConnectionTracker,
}

impl RelayServer {
    /// Create a relay that forwards to `config.target` through `client`.
    pub fn new(config: RelayConfig, client: Arc<dyn TargetClient>) -> Self {
        let dispatcher = Dispatcher::new(config.target.address.as_str(), client);
        let handler = Arc::new(ConnectionHandler::new(config.framing.clone(), dispatcher));

        Self {
            config,
            handler,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// A bind failure is fatal: it is logged and returned, and no connection is ever accepted.
    pub async fn serve(self, shutdown: broadcast::Receiver<()>) -> Result<(), ListenerError> {
        let listener = match Listener::bind(&self.config.listener).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, "unable to start server");
                return Err(e);
            }
        };

        self.run(listener, shutdown).await;
        Ok(())
    }

    /// Accept connections on `listener` until `shutdown` fires, then drain.
    ///
    /// Dropping every `Shutdown` handle also stops the loop.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(
                address = %addr,
                target = %self.config.target.address,
                framing = %self.config.framing.policy,
                idle_timeout_ms = self.config.framing.idle_timeout_ms,
                "started server"
            ),
            Err(e) => tracing::warn!(error = %e, "started server on unknown address"),
        }

        let mut backoff = AcceptBackoff::new();

        loop {
            let accepted = tokio::select! {
                res = listener.accept() => res,
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
            };

            match accepted {
                Ok((stream, peer_addr)) => {
                    backoff.reset();

                    let guard = self.tracker.track();
                    let ctx = ConnectionContext::new(guard.id(), peer_addr);
                    let handler = Arc::clone(&self.handler);

                    tokio::spawn(async move {
                        handler.handle(stream, ctx).await;
                        drop(guard);
                    });
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    tracing::error!(
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "unable to accept connection"
                    );
                    if shutdown_during(delay, &mut shutdown).await {
                        tracing::info!("Shutdown requested, no longer accepting connections");
                        break;
                    }
                }
            }
        }

        drop(listener);
        self.drain().await;
    }

    async fn drain(&self) {
        let open = self.tracker.active_count();
        if open == 0 {
            tracing::info!("Relay stopped");
            return;
        }

        let timeout = self.config.listener.drain_timeout();
        tracing::info!(open_connections = open, timeout_secs = timeout.as_secs(), "Draining connections");

        if self.tracker.wait_for_drain(timeout).await {
            tracing::info!("Relay stopped");
        } else {
            tracing::warn!(
                open_connections = self.tracker.active_count(),
                "Drain timeout elapsed, abandoning open connections"
            );
        }
    }
}

/// Sleep for `delay` unless shutdown fires first. Returns `true` on shutdown.
async fn shutdown_during(delay: Duration, shutdown: &mut broadcast::Receiver<()>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = shutdown.recv() => true,
    }
}

impl std::fmt::Debug for RelayServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayServer")
            .field("config", &self.config)
            .field("open_connections", &self.tracker.active_count())
            .finish()
    }
}
