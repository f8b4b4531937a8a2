//! Per-connection handling.
//!
//! # Responsibilities
//! - Own one accepted socket until it closes
//! - Apply the configured framing policy to the byte stream
//! - Hand each message to the dispatcher
//!
//! The socket is moved into the handler, so it is closed when the handler
//! returns on every path.

use std::time::Duration;

use tokio::io::{AsyncRead, BufReader};

use crate::config::{FramingConfig, FramingPolicy};
use crate::http::dispatcher::Dispatcher;
use crate::net::connection::ConnectionContext;
use crate::net::framing::{read_line, ChunkReader, FrameError};

/// Applies one framing policy to every connection it is given.
#[derive(Debug, Clone)]
pub struct ConnectionHandler {
    framing: FramingConfig,
    dispatcher: Dispatcher,
}

impl ConnectionHandler {
    pub fn new(framing: FramingConfig, dispatcher: Dispatcher) -> Self {
        Self { framing, dispatcher }
    }

    /// Serve one connection to completion.
    pub async fn handle<S>(&self, stream: S, ctx: ConnectionContext)
    where
        S: AsyncRead + Unpin + Send,
    {
        tracing::info!(
            connection_id = %ctx.id,
            peer_addr = %ctx.peer_addr,
            framing = %self.framing.policy,
            "connection opened"
        );

        match self.framing.policy {
            FramingPolicy::Line => self.handle_line(stream, ctx).await,
            FramingPolicy::Chunk => self.handle_chunks(stream, ctx).await,
        }

        tracing::info!(
            connection_id = %ctx.id,
            peer_addr = %ctx.peer_addr,
            "connection closed"
        );
    }

    /// At most one message per connection, bounded by the idle deadline.
    async fn handle_line<S>(&self, stream: S, ctx: ConnectionContext)
    where
        S: AsyncRead + Unpin + Send,
    {
        let mut reader = BufReader::new(stream);

        let message = match read_line(&mut reader, self.framing.idle_timeout()).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                tracing::debug!(
                    connection_id = %ctx.id,
                    peer_addr = %ctx.peer_addr,
                    "closed before sending data"
                );
                return;
            }
            Err(FrameError::IdleTimeout(limit)) => {
                tracing::error!(
                    connection_id = %ctx.id,
                    peer_addr = %ctx.peer_addr,
                    timeout_ms = duration_ms(limit),
                    "connection timed out"
                );
                return;
            }
            Err(FrameError::Io(e)) => {
                tracing::error!(
                    connection_id = %ctx.id,
                    peer_addr = %ctx.peer_addr,
                    error = %e,
                    "error reading data"
                );
                return;
            }
        };

        if !message.ends_with(b"\n") {
            tracing::info!(
                connection_id = %ctx.id,
                peer_addr = %ctx.peer_addr,
                bytes = message.len(),
                "finished reading data at end of stream"
            );
        }

        self.dispatcher.dispatch(ctx, message).await;
    }

    /// One message per read; dispatches run as independent tasks.
    async fn handle_chunks<S>(&self, stream: S, ctx: ConnectionContext)
    where
        S: AsyncRead + Unpin + Send,
    {
        let mut chunks = ChunkReader::new(stream, self.framing.chunk_size);

        loop {
            match chunks.next_chunk().await {
                Ok(Some(chunk)) => {
                    tracing::debug!(
                        connection_id = %ctx.id,
                        peer_addr = %ctx.peer_addr,
                        bytes = chunk.len(),
                        "received chunk"
                    );
                    let dispatcher = self.dispatcher.clone();
                    tokio::spawn(async move {
                        dispatcher.dispatch(ctx, chunk).await;
                    });
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(
                        connection_id = %ctx.id,
                        peer_addr = %ctx.peer_addr,
                        error = %e,
                        "error reading data"
                    );
                    break;
                }
            }
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}
