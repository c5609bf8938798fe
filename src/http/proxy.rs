//! Proxy handler.
//!
//! Selects a backend, forwards the request, and relays the response.
//! Failures map to 503 (no healthy backend) or 502 (upstream failure).
//! Backend health is not touched here unless passive health is enabled.

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, State},
    http::{response::Parts, HeaderMap, Method, Request, Uri},
    response::{IntoResponse, Response},
};
use tokio::time;

use crate::http::request::{build_upstream_request, request_id};
use crate::http::response::{relay_response, ProxyError};
use crate::http::server::AppState;
use crate::load_balancer::Backend;
use crate::observability::metrics;

/// Main proxy handler.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&headers).to_string();
    let method_str = method.to_string();
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/").to_string();

    let body = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            let err = ProxyError::from(rejection);
            tracing::warn!(request_id = %request_id, method = %method, path = %path, error = %err, "Rejected request body");
            metrics::record_request(&method_str, err.status().as_u16(), metrics::NO_BACKEND, start_time);
            return err.into_response();
        }
    };

    // 1. Select Backend
    let Some(backend) = state.selector.next() else {
        tracing::warn!(request_id = %request_id, method = %method, path = %path, "No healthy backends");
        metrics::record_request(&method_str, 503, metrics::NO_BACKEND, start_time);
        return ProxyError::NoHealthyBackend.into_response();
    };

    // 2. Forward
    let result = forward(&state, &backend, method.clone(), &uri, &headers, body).await;
    let backend_label = backend.endpoint.as_str();

    match result {
        Ok((parts, bytes)) => {
            let status = parts.status;
            state.passive_health.report_success(&backend);

            tracing::info!(
                request_id = %request_id,
                method = %method,
                path = %path,
                backend = %backend.endpoint,
                status = status.as_u16(),
                latency_ms = start_time.elapsed().as_millis() as u64,
                "Routed request"
            );
            metrics::record_request(&method_str, status.as_u16(), backend_label, start_time);

            relay_response(parts, bytes)
        }
        Err(err) => {
            if err.is_upstream_failure() {
                state.passive_health.report_failure(&backend);
            }

            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                backend = %backend.endpoint,
                error = %err,
                "Upstream error"
            );
            metrics::record_request(&method_str, err.status().as_u16(), backend_label, start_time);

            err.into_response()
        }
    }
}

/// Send the request to `backend` and buffer its response, within the proxy timeout.
async fn forward(
    state: &AppState,
    backend: &Backend,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<(Parts, Bytes), ProxyError> {
    let request: Request<Body> = build_upstream_request(method, uri, headers, body, &backend.endpoint)?;

    let exchange = async {
        let response = state
            .client
            .request(request)
            .await
            .map_err(ProxyError::UpstreamTransport)?;
        let (parts, incoming) = response.into_parts();
        let bytes = axum::body::to_bytes(Body::new(incoming), state.max_response_bytes)
            .await
            .map_err(ProxyError::MalformedUpstreamResponse)?;
        Ok::<_, ProxyError>((parts, bytes))
    };

    match time::timeout(state.proxy_timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(ProxyError::UpstreamTimeout(state.proxy_timeout)),
    }
}
