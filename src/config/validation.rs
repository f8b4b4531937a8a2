//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the target is a bare `host:port` authority
//! - Validate value ranges (chunk size, log level)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::RelayConfig;

/// Largest accepted chunk-policy read buffer.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("target.address must not be empty")]
    EmptyTarget,

    #[error("target.address '{address}' is invalid: {reason}")]
    Target { address: String, reason: String },

    #[error("framing.chunk_size must be between 1 and {max}, got {got}")]
    ChunkSize { got: usize, max: usize },

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    LogLevel(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Err(e) = validate_target(&config.target.address) {
        errors.push(e);
    }

    let chunk_size = config.framing.chunk_size;
    if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
        errors.push(ValidationError::ChunkSize {
            got: chunk_size,
            max: MAX_CHUNK_SIZE,
        });
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The target is spliced into `http://<target>/`, so it must be an authority and nothing more.
pub fn validate_target(address: &str) -> Result<(), ValidationError> {
    if address.trim().is_empty() {
        return Err(ValidationError::EmptyTarget);
    }

    let invalid = |reason: &str| ValidationError::Target {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    if address.trim() != address {
        return Err(invalid("must not have surrounding whitespace"));
    }
    if address.contains("://") {
        return Err(invalid("must not include a scheme"));
    }
    if address.contains(['/', '?', '#']) {
        return Err(invalid("must not include a path, query or fragment"));
    }

    let url = Url::parse(&format!("http://{}/", address)).map_err(|e| invalid(&e.to_string()))?;
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("must not include credentials"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }

    Ok(())
}
