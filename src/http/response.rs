//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the backend response to the client
//! - Strip hop-by-hop headers
//! - Map proxy failures to appropriate HTTP status codes
//!
//! # Design Decisions
//! - No healthy backend results in 503 Service Unavailable
//! - Upstream transport failures and timeouts result in 502 Bad Gateway
//! - Every failure produces a well-formed response with a text body

use std::error::Error as _;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::rejection::BytesRejection;
use axum::http::{response::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::request::forwardable_headers;

/// Failures surfaced to the client by the proxy handler.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("All backend services are unavailable")]
    NoHealthyBackend,

    #[error("Bad Gateway: upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("Bad Gateway: {}", error_chain(.0))]
    UpstreamTransport(#[source] hyper_util::client::legacy::Error),

    #[error("Bad Gateway: malformed upstream response: {0}")]
    MalformedUpstreamResponse(#[source] axum::Error),

    #[error("Bad Gateway: could not build upstream request: {0}")]
    InvalidUpstreamRequest(#[from] axum::http::Error),

    #[error("{}", rejection_text(.0))]
    RequestBody(#[from] BytesRejection),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoHealthyBackend => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::UpstreamTimeout(_)
            | ProxyError::UpstreamTransport(_)
            | ProxyError::MalformedUpstreamResponse(_)
            | ProxyError::InvalidUpstreamRequest(_) => StatusCode::BAD_GATEWAY,
            ProxyError::RequestBody(rejection) => rejection.status(),
        }
    }

    /// Whether the failure happened on the way to or from the backend.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            ProxyError::UpstreamTimeout(_)
                | ProxyError::UpstreamTransport(_)
                | ProxyError::MalformedUpstreamResponse(_)
        )
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Render an error with its causes, e.g. `client error (Connect): tcp connect error: ...`.
fn error_chain(err: &hyper_util::client::legacy::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn rejection_text(rejection: &BytesRejection) -> String {
    rejection.body_text()
}

/// Build the client response from a buffered backend response.
pub fn relay_response(parts: Parts, body: Bytes) -> Response {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = parts.status;
    *response.headers_mut() = forwardable_headers(&parts.headers);
    response
}
