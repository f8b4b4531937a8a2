//! Resilience helpers.
//!
//! Upstream requests are neither retried nor timed out; the only pacing
//! applied is between failed accepts.

pub mod backoff;

pub use backoff::AcceptBackoff;
