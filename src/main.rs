//! TCP-to-HTTP relay.
//!
//! # Architecture Overview
//!
//! ```text
//!   TCP client                         RELAY
//!   ── bytes ──▶ net::listener ──▶ net::handler (one task per connection)
//!                                       │
//!                                       ▼
//!                                 net::framing (line | chunk)
//!                                       │ message
//!                                       ▼
//!                                 http::dispatcher ──▶ GET http://<target>/<message>
//!
//!   Cross-cutting: config · observability · lifecycle · resilience
//! ```
//!
//! Nothing is written back to the TCP client; outcomes are only logged.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use tcp_relay::config::{resolve_config, CliArgs};
use tcp_relay::lifecycle::{spawn_signal_handler, Shutdown};
use tcp_relay::observability::init_logging;
use tcp_relay::{HyperTargetClient, RelayServer};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tcp-relay: {}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("tcp-relay: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        target = %config.target.address,
        framing = %config.framing.policy,
        "tcp-relay starting"
    );

    let shutdown = Shutdown::new();
    spawn_signal_handler(&shutdown);

    let server = RelayServer::new(config, Arc::new(HyperTargetClient::new()));
    match server.serve(shutdown.subscribe()).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}
