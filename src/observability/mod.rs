//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! listener / handler / dispatcher
//!     → tracing events with connection_id, peer_addr, message_id fields
//!     → logging.rs (EnvFilter + fmt layer, pretty or JSON)
//!     → stdout
//! ```
//!
//! Log output is the relay's only observable result; nothing is written
//! back to TCP clients.

pub mod logging;

pub use logging::init_logging;
