//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file)
//!     → cli.rs (flags and environment variables)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared by reference/clone with every connection task
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the server is constructed
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::CliArgs;
pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    FramingConfig, FramingPolicy, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig,
    TargetConfig,
};
