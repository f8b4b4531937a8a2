//! TCP-to-HTTP relay library.
//!
//! Accepts raw TCP connections, splits each byte stream into messages and
//! forwards every message as `GET http://<target>/<message>`.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod server;

pub use config::RelayConfig;
pub use http::{HyperTargetClient, TargetClient};
pub use lifecycle::Shutdown;
pub use server::RelayServer;
