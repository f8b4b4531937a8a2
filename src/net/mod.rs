//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, no connection ceiling)
//!     → connection.rs (connection ID, context, open-connection tracking)
//!     → handler.rs (owns the socket, applies framing)
//!     → framing.rs (line or chunk messages)
//!     → Hand each message to the dispatcher
//! ```
//!
//! # Design Decisions
//! - One task per connection, no shared mutable state between them
//! - Sockets are owned by their handler and closed when it returns
//! - Framing policy is fixed for the lifetime of the relay

pub mod connection;
pub mod framing;
pub mod handler;
pub mod listener;

pub use connection::{ConnectionContext, ConnectionId, ConnectionTracker};
pub use handler::ConnectionHandler;
pub use listener::{Listener, ListenerError};
