//! Message framing over a raw byte stream.
//!
//! Two policies, selected once per relay:
//!
//! ```text
//! Line:  [bytes ... '\n']             → one message, then the connection closes
//!        [bytes ... EOF]              → partial data is the final message
//!        [deadline elapses]           → no message
//!
//! Chunk: [read #1][read #2] ... [EOF] → one message per read that returned data
//! ```

use std::time::Duration;

use axum::body::Bytes;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt};

/// Error type for framing operations.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// No delimiter arrived before the idle deadline.
    #[error("no message delimiter within {0:?}")]
    IdleTimeout(Duration),

    /// The socket failed with something other than end-of-stream.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a single newline-delimited message.
///
/// The deadline covers the whole read, not each individual syscall: a client
/// trickling bytes without ever sending `\n` still times out. Returns
/// `Ok(None)` when the peer closed without sending anything.
pub async fn read_line<R>(reader: &mut R, idle_timeout: Option<Duration>) -> Result<Option<Bytes>, FrameError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();

    let read = reader.read_until(b'\n', &mut buf);
    let n = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, read)
            .await
            .map_err(|_| FrameError::IdleTimeout(limit))??,
        None => read.await?,
    };

    if n == 0 {
        return Ok(None);
    }
    Ok(Some(Bytes::from(buf)))
}

/// Splits a stream into one message per successful read.
pub struct ChunkReader<R> {
    reader: R,
    buf: Box<[u8]>,
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buf: vec![0u8; chunk_size].into_boxed_slice(),
        }
    }

    /// Next chunk, or `Ok(None)` at end-of-stream.
    pub async fn next_chunk(&mut self) -> std::io::Result<Option<Bytes>> {
        let n = self.reader.read(&mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(Bytes::copy_from_slice(&self.buf[..n])))
    }
}

/// Decode and trim a raw message for use as a path segment.
///
/// Invalid UTF-8 is replaced rather than rejected; legacy clients are not
/// expected to be careful about encodings.
pub fn trim_message(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}
