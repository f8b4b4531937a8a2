//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, drain timeout).
    pub listener: ListenerConfig,

    /// Upstream HTTP target.
    pub target: TargetConfig,

    /// How inbound byte streams are split into messages.
    pub framing: FramingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// How long to wait for open connections after shutdown is requested.
    pub drain_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            drain_timeout_secs: 5,
        }
    }
}

impl ListenerConfig {
    /// Bind address for a bare port, listening on every interface.
    pub fn address_for_port(port: u16) -> String {
        format!("0.0.0.0:{}", port)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

/// Upstream target that receives forwarded GET requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Target authority as `host:port` (no scheme, no path).
    pub address: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            address: "localhost:9002".to_string(),
        }
    }
}

/// Framing policy applied to every accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FramingPolicy {
    /// One newline-delimited message per connection, bounded by the idle timeout.
    #[default]
    Line,
    /// Every read becomes its own message; no idle timeout.
    Chunk,
}

impl std::str::FromStr for FramingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "line" => Ok(FramingPolicy::Line),
            "chunk" => Ok(FramingPolicy::Chunk),
            other => Err(format!("unknown framing policy '{}' (expected line or chunk)", other)),
        }
    }
}

impl std::fmt::Display for FramingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FramingPolicy::Line => write!(f, "line"),
            FramingPolicy::Chunk => write!(f, "chunk"),
        }
    }
}

/// Framing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Selected framing policy.
    pub policy: FramingPolicy,

    /// Idle deadline for a line to arrive, in milliseconds (0 = wait forever).
    /// Only consulted by the line policy.
    pub idle_timeout_ms: u64,

    /// Read buffer size for the chunk policy.
    pub chunk_size: usize,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            policy: FramingPolicy::Line,
            idle_timeout_ms: 2000,
            chunk_size: 4096,
        }
    }
}

impl FramingConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.idle_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected pretty or json)", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty for terminals, JSON for log shippers.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
