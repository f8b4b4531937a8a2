//! Outbound HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! raw message (from net::handler)
//!     → dispatcher.rs (trim, log, invoke client, read body)
//!     → request.rs (GET http://<target>/<escaped message>)
//!     → client.rs (TargetClient: one request/response exchange)
//! ```

pub mod client;
pub mod dispatcher;
pub mod request;

pub use client::{BoxError, HyperTargetClient, TargetClient};
pub use dispatcher::{Delivered, DispatchError, Dispatcher};
