//! Shared utilities for relay integration tests.

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, Uri};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use tcp_relay::config::{FramingPolicy, RelayConfig};
use tcp_relay::http::BoxError;
use tcp_relay::net::Listener;
use tcp_relay::{RelayServer, Shutdown, TargetClient};

pub const TARGET: &str = "localhost:9002";

/// Shared in-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn lines(&self) -> Vec<String> {
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

/// Route this thread's logs into a buffer until the guard drops.
///
/// `#[tokio::test]` runs every spawned task on the test thread, so relay tasks
/// log here too.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}

/// Target client double that records every request and answers `200 SUCCESS`.
///
/// Calls listed in `fail_on` (0-based) return an error instead.
#[derive(Default)]
pub struct RecordingClient {
    uris: Mutex<Vec<Uri>>,
    calls: AtomicUsize,
    fail_on: Vec<usize>,
}

impl RecordingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(calls: Vec<usize>) -> Arc<Self> {
        Arc::new(Self {
            fail_on: calls,
            ..Self::default()
        })
    }

    pub fn uris(&self) -> Vec<Uri> {
        self.uris.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.uris().iter().map(|u| u.path().to_string()).collect();
        paths.sort();
        paths
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Poll until at least `count` calls were made or two seconds pass.
    pub async fn wait_for_calls(&self, count: usize) -> usize {
        for _ in 0..200 {
            if self.calls() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.calls()
    }
}

#[async_trait]
impl TargetClient for RecordingClient {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, BoxError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&call) {
            return Err(format!("injected failure on call {}", call).into());
        }
        self.uris.lock().unwrap().push(request.uri().clone());
        Ok(Response::new(Body::from("SUCCESS")))
    }
}

/// Relay config for tests: loopback, fixed target, short drain.
pub fn relay_config(policy: FramingPolicy, idle_timeout_ms: u64) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.listener.drain_timeout_secs = 1;
    config.target.address = TARGET.to_string();
    config.framing.policy = policy;
    config.framing.idle_timeout_ms = idle_timeout_ms;
    config
}

/// A relay running on an ephemeral loopback port.
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: tokio::task::JoinHandle<()>,
}

pub async fn start_relay(config: RelayConfig, client: Arc<dyn TargetClient>) -> RunningRelay {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = RelayServer::new(config, client);
    let rx: broadcast::Receiver<()> = shutdown.subscribe();
    let task = tokio::spawn(server.run(Listener::from_tcp(tcp), rx));

    RunningRelay { addr, shutdown, task }
}

/// Start a mock HTTP backend that records request paths and answers with `(status, body)`.
pub async fn start_recording_backend(status: u16, body: &'static str) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let paths = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&paths);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let paths = Arc::clone(&recorded);
                    tokio::spawn(async move {
                        let mut request = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => request.extend_from_slice(&buf[..n]),
                            }
                        }

                        let head = String::from_utf8_lossy(&request);
                        if let Some(path) = head.lines().next().and_then(|l| l.split(' ').nth(1)) {
                            paths.lock().unwrap().push(path.to_string());
                        }

                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, paths)
}
