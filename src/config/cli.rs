//! Command-line and environment overrides.
//!
//! Every flag can also be supplied through the environment variable named
//! next to it, so the relay can be started with just `PORT` and `TARGET`.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::{FramingPolicy, ListenerConfig, LogFormat, RelayConfig};

/// Command-line arguments for the relay.
#[derive(Parser, Debug, Default)]
#[command(name = "tcp-relay")]
#[command(version)]
#[command(about = "Relay raw TCP messages to an HTTP backend as GET requests", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen on (binds every interface)
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Upstream target as host:port
    #[arg(short, long, env = "TARGET")]
    pub target: Option<String>,

    /// Line framing idle deadline in milliseconds (0 disables)
    #[arg(long, env = "IDLE_TIMEOUT_MS")]
    pub idle_timeout_ms: Option<u64>,

    /// Framing policy: line or chunk
    #[arg(long, env = "FRAMING")]
    pub framing: Option<FramingPolicy>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log format: pretty or json
    #[arg(long, env = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl CliArgs {
    /// Overlay every flag that was given onto `config`.
    pub fn apply(&self, config: &mut RelayConfig) {
        if let Some(port) = self.port {
            config.listener.bind_address = ListenerConfig::address_for_port(port);
        }
        if let Some(ref target) = self.target {
            config.target.address = target.clone();
        }
        if let Some(ms) = self.idle_timeout_ms {
            config.framing.idle_timeout_ms = ms;
        }
        if let Some(policy) = self.framing {
            config.framing.policy = policy;
        }
        if let Some(ref level) = self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
    }
}
