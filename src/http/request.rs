//! Outbound request construction.
//!
//! # Responsibilities
//! - Turn `(target, message)` into `GET http://<target>/<message>`
//! - Percent-encode the message as a single path segment
//!
//! # Design Decisions
//! - The message can never add path segments, a query or a fragment:
//!   `/`, `?`, `#` and `%` are all encoded
//! - `.` and `..` are refused outright since they would be normalized away
//! - The authority is the configured target as written; `url` only supplies
//!   the encoded path, since it drops default ports such as `:80`

use axum::body::Body;
use axum::http::uri::{Authority, Scheme};
use axum::http::{Method, Request, Uri};
use url::Url;

/// Why an outbound request could not be built. Nothing is sent in any of these cases.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid target '{target}': {source}")]
    Target {
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error("target '{0}' cannot carry a path")]
    CannotBeABase(String),

    #[error("message '{0}' is a relative path segment")]
    DotSegment(String),

    #[error("invalid request: {0}")]
    Http(#[from] axum::http::Error),

    #[error("invalid uri: {0}")]
    Uri(#[from] axum::http::uri::InvalidUri),
}

/// Build the URL for a trimmed message.
pub fn target_url(target: &str, message: &str) -> Result<Url, BuildError> {
    if message == "." || message == ".." {
        return Err(BuildError::DotSegment(message.to_string()));
    }

    let mut url = Url::parse(&format!("http://{}/", target)).map_err(|source| BuildError::Target {
        target: target.to_string(),
        source,
    })?;

    url.path_segments_mut()
        .map_err(|_| BuildError::CannotBeABase(target.to_string()))?
        .pop_if_empty()
        .push(message);

    Ok(url)
}

/// Build the outbound GET for a trimmed message.
pub fn build_request(target: &str, message: &str) -> Result<Request<Body>, BuildError> {
    let url = target_url(target, message)?;
    let authority: Authority = target.parse()?;
    let uri = Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(authority)
        .path_and_query(url.path())
        .build()?;

    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())?;
    Ok(request)
}
