//! Request dispatch.
//!
//! # Responsibilities
//! - Build the outbound GET for one message
//! - Invoke the target client exactly once (no retries)
//! - Read the full response body
//! - Log the outcome against the originating connection
//!
//! # Design Decisions
//! - `forward` returns a typed result for callers that care (tests)
//! - `dispatch` is the fire-and-forget entry point: every failure stops at a log line
//! - A body read failure still reports the status code that was already received

use std::sync::Arc;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{StatusCode, Uri};
use uuid::Uuid;

use crate::http::client::{BoxError, TargetClient};
use crate::http::request::{build_request, BuildError};
use crate::net::connection::ConnectionContext;
use crate::net::framing::trim_message;

/// Why a message did not produce a complete upstream exchange.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unable to create request: {0}")]
    Build(#[from] BuildError),

    #[error("request failed: {0}")]
    Upstream(#[source] BoxError),

    #[error("unable to read body (status {status}): {source}")]
    Body {
        status: StatusCode,
        #[source]
        source: axum::Error,
    },
}

/// A completed upstream exchange.
#[derive(Debug, Clone)]
pub struct Delivered {
    pub uri: Uri,
    pub status: StatusCode,
    pub body: Bytes,
}

/// Forwards messages to the configured target.
///
/// Cloning is cheap; every clone shares the same client.
#[derive(Clone)]
pub struct Dispatcher {
    target: Arc<str>,
    client: Arc<dyn TargetClient>,
}

impl Dispatcher {
    pub fn new(target: impl Into<Arc<str>>, client: Arc<dyn TargetClient>) -> Self {
        Self {
            target: target.into(),
            client,
        }
    }

    /// Forward one raw message and log the outcome. Never fails from the caller's view.
    pub async fn dispatch(&self, ctx: ConnectionContext, message: Bytes) {
        let message_id = Uuid::new_v4();

        match self.forward(ctx, message_id, &message).await {
            Ok(delivered) => {
                tracing::info!(
                    connection_id = %ctx.id,
                    peer_addr = %ctx.peer_addr,
                    message_id = %message_id,
                    status_code = delivered.status.as_u16(),
                    body = %String::from_utf8_lossy(&delivered.body),
                    "response"
                );
            }
            Err(DispatchError::Body { status, source }) => {
                tracing::error!(
                    connection_id = %ctx.id,
                    peer_addr = %ctx.peer_addr,
                    message_id = %message_id,
                    error = %source,
                    "unable to read body"
                );
                tracing::info!(
                    connection_id = %ctx.id,
                    peer_addr = %ctx.peer_addr,
                    message_id = %message_id,
                    status_code = status.as_u16(),
                    body = "",
                    "response"
                );
            }
            Err(e) => {
                tracing::error!(
                    connection_id = %ctx.id,
                    peer_addr = %ctx.peer_addr,
                    message_id = %message_id,
                    error = %e,
                    "message dropped"
                );
            }
        }
    }

    /// Forward one raw message, returning the upstream status and body.
    pub async fn forward(
        &self,
        ctx: ConnectionContext,
        message_id: Uuid,
        message: &[u8],
    ) -> Result<Delivered, DispatchError> {
        let message = trim_message(message);
        let request = build_request(&self.target, &message)?;
        let uri = request.uri().clone();

        tracing::info!(
            connection_id = %ctx.id,
            peer_addr = %ctx.peer_addr,
            message_id = %message_id,
            uri = %uri,
            "sending request"
        );

        let response = self
            .client
            .send(request)
            .await
            .map_err(DispatchError::Upstream)?;

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|source| DispatchError::Body { status, source })?;

        Ok(Delivered { uri, status, body })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::connection::ConnectionId;
    use async_trait::async_trait;
    use axum::http::{Request, Response};
    use std::io;
    use std::sync::Mutex;

    /// In-memory log sink for asserting on emitted lines.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    #[derive(Default)]
    struct Recorder {
        uris: Mutex<Vec<Uri>>,
    }

    #[async_trait]
    impl TargetClient for Recorder {
        async fn send(&self, request: Request<Body>) -> Result<Response<Body>, BoxError> {
            self.uris.lock().unwrap().push(request.uri().clone());
            Ok(Response::builder()
                .status(200)
                .body(Body::from("SUCCESS"))
                .unwrap())
        }
    }

    struct Refusing;

    #[async_trait]
    impl TargetClient for Refusing {
        async fn send(&self, _request: Request<Body>) -> Result<Response<Body>, BoxError> {
            Err("connection refused".into())
        }
    }

    struct BrokenBody;

    #[async_trait]
    impl TargetClient for BrokenBody {
        async fn send(&self, _request: Request<Body>) -> Result<Response<Body>, BoxError> {
            let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
                Ok(Bytes::from_static(b"part")),
                Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            ];
            let body = Body::from_stream(futures_util::stream::iter(chunks));
            Ok(Response::builder().status(503).body(body).unwrap())
        }
    }

    fn ctx() -> ConnectionContext {
        ConnectionContext::new(ConnectionId::new(), "127.0.0.1:50000".parse().unwrap())
    }

    #[tokio::test]
    async fn forwards_trimmed_message_as_path() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new("localhost:9002", recorder.clone());

        let delivered = dispatcher
            .forward(ctx(), Uuid::new_v4(), b"  ConfrenceDualMode\n")
            .await
            .unwrap();

        assert_eq!(delivered.status, StatusCode::OK);
        assert_eq!(delivered.body, Bytes::from_static(b"SUCCESS"));
        assert_eq!(delivered.uri.to_string(), "http://localhost:9002/ConfrenceDualMode");

        let uris = recorder.uris.lock().unwrap();
        assert_eq!(uris.len(), 1);
        assert_eq!(uris[0].authority().map(|a| a.as_str()), Some("localhost:9002"));
    }

    #[tokio::test]
    async fn build_failure_sends_nothing() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new("localhost:9002", recorder.clone());

        let err = dispatcher.forward(ctx(), Uuid::new_v4(), b"..\n").await.unwrap_err();
        assert!(matches!(err, DispatchError::Build(_)));
        assert!(recorder.uris.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_is_reported() {
        let dispatcher = Dispatcher::new("localhost:9002", Arc::new(Refusing));
        let err = dispatcher.forward(ctx(), Uuid::new_v4(), b"x").await.unwrap_err();
        assert!(matches!(err, DispatchError::Upstream(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn body_failure_keeps_status() {
        let dispatcher = Dispatcher::new("localhost:9002", Arc::new(BrokenBody));
        let err = dispatcher.forward(ctx(), Uuid::new_v4(), b"x").await.unwrap_err();
        match err {
            DispatchError::Body { status, .. } => assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE),
            other => panic!("expected body error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn dispatch_logs_status_after_body_failure() {
        let (logs, _guard) = capture_logs();
        let dispatcher = Dispatcher::new("localhost:9002", Arc::new(BrokenBody));

        dispatcher.dispatch(ctx(), Bytes::from_static(b"x")).await;

        let lines = logs.lines();
        let failure = lines
            .iter()
            .position(|l| l.contains("unable to read body"))
            .expect("body failure is logged");
        let response = lines
            .iter()
            .position(|l| l.contains("response") && l.contains("status_code=503"))
            .expect("status is logged after body failure");
        assert!(failure < response);
        assert!(lines[response].contains("peer_addr=127.0.0.1:50000"));
        assert!(!lines.iter().any(|l| l.contains("message dropped")));
    }

    #[tokio::test]
    async fn dispatch_swallows_failures() {
        let dispatcher = Dispatcher::new("localhost:9002", Arc::new(Refusing));
        dispatcher.dispatch(ctx(), Bytes::from_static(b"x")).await;
    }
}
