//! Request handling and transformation.
//!
//! # Responsibilities
//! - Identify requests (X-Request-ID) for tracing
//! - Strip connection-scoped headers before forwarding
//! - Prepare the upstream request for the selected backend
//!
//! # Design Decisions
//! - The original path and query are reused verbatim
//! - `Host` is never forwarded; the client sets it from the backend URL
//! - The body is forwarded as buffered bytes

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, Method, Request, Uri};

use crate::load_balancer::BackendEndpoint;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Whether a header must not cross the proxy.
///
/// Covers `Host` plus the connection-scoped headers of RFC 7230.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "host"
            | "connection"
            | "keep-alive"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Extra header names listed in `Connection`, which are connection-scoped too.
fn connection_listed(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

/// Copy every end-to-end header, preserving order and repeated values.
pub fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let listed = connection_listed(headers);
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if is_hop_by_hop(name) || listed.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// The request ID assigned to this request, if any.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Build the request sent to `endpoint` on behalf of the client.
pub fn build_upstream_request(
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
    endpoint: &BackendEndpoint,
) -> Result<Request<Body>, axum::http::Error> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    let mut builder = Request::builder()
        .method(method)
        .uri(endpoint.url_for(path_and_query));
    if let Some(out) = builder.headers_mut() {
        *out = forwardable_headers(headers);
    }
    builder.body(Body::from(body))
}
