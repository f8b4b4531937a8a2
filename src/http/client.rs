//! Upstream HTTP client seam.
//!
//! The relay only needs one capability from HTTP: send a request, get a
//! response or an error. Keeping that behind a trait lets the framing and
//! dispatch logic be tested without a network.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Boxed error returned by a [`TargetClient`]. The relay never inspects its concrete type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Performs one HTTP request/response exchange against the target.
#[async_trait]
pub trait TargetClient: Send + Sync {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, BoxError>;
}

/// Production client: hyper's pooled HTTP/1 client over plain TCP.
#[derive(Clone)]
pub struct HyperTargetClient {
    inner: Client<HttpConnector, Body>,
}

impl HyperTargetClient {
    pub fn new() -> Self {
        let inner = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { inner }
    }
}

impl Default for HyperTargetClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TargetClient for HyperTargetClient {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, BoxError> {
        let response = self.inner.request(request).await?;
        Ok(response.map(Body::new))
    }
}
