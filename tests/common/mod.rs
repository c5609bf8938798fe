//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use lb_proxy::config::{BackendConfig, ProxyConfig};
use lb_proxy::http::HttpServer;
use lb_proxy::lifecycle::Shutdown;
use lb_proxy::load_balancer::Registry;
use tokio::net::TcpListener;

/// Request headers the mock echoes back as `x-seen-<name>`.
const ECHOED_HEADERS: [&str; 6] = [
    "host",
    "x-custom",
    "x-request-id",
    "content-type",
    "authorization",
    "x-hop",
];

/// A programmable backend: `/health` follows `healthy`, everything else echoes.
#[derive(Clone)]
pub struct MockBackend {
    pub name: &'static str,
    pub addr: SocketAddr,
    pub healthy: Arc<AtomicBool>,
    pub slow: Arc<AtomicBool>,
    pub hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_slow(&self, slow: bool) {
        self.slow.store(slow, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a mock backend on an ephemeral port.
pub async fn start_backend(name: &'static str) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = MockBackend {
        name,
        addr: listener.local_addr().unwrap(),
        healthy: Arc::new(AtomicBool::new(true)),
        slow: Arc::new(AtomicBool::new(false)),
        hits: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/status/{code}", get(status))
        .fallback(echo)
        .with_state(backend.clone());

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    backend
}

/// Start `n` mock backends named b1..bn.
pub async fn start_backends(n: usize) -> Vec<MockBackend> {
    const NAMES: [&str; 8] = ["b1", "b2", "b3", "b4", "b5", "b6", "b7", "b8"];
    let mut backends = Vec::with_capacity(n);
    for name in NAMES.iter().take(n) {
        backends.push(start_backend(name).await);
    }
    backends
}

async fn health(State(backend): State<MockBackend>) -> StatusCode {
    if backend.healthy.load(Ordering::SeqCst) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn status(State(backend): State<MockBackend>, Path(code): Path<u16>) -> Response {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    let status = StatusCode::from_u16(code).unwrap();
    (
        status,
        [("x-upstream", "yes"), ("x-backend", backend.name)],
        format!("status {}", code),
    )
        .into_response()
}

async fn echo(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    backend.hits.fetch_add(1, Ordering::SeqCst);
    if backend.slow.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }

    let mut response = Response::new(Body::from(body));
    let out = response.headers_mut();
    out.insert("x-backend", HeaderValue::from_static(backend.name));
    out.insert("x-seen-method", HeaderValue::from_str(method.as_str()).unwrap());
    out.insert("x-seen-uri", HeaderValue::from_str(&uri.to_string()).unwrap());
    for name in ECHOED_HEADERS {
        if let Some(value) = headers.get(name) {
            let seen = HeaderName::from_bytes(format!("x-seen-{}", name).as_bytes()).unwrap();
            out.insert(seen, value.clone());
        }
    }
    response
}

/// Start a listener that accepts connections and never answers.
pub async fn start_black_hole() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Proxy configuration with short test timings.
pub fn proxy_config(urls: &[String]) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backends = urls.iter().map(BackendConfig::new).collect();
    config.health_check.interval_ms = 100;
    config.health_check.timeout_ms = 200;
    config.proxy.timeout_ms = 1_000;
    config
}

pub struct RunningProxy {
    pub addr: SocketAddr,
    pub registry: Arc<Registry>,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig) -> RunningProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let registry = server.registry().clone();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(server.run(listener, rx));

    RunningProxy {
        addr,
        registry,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// Time an async operation.
pub async fn timed<F, T>(f: F) -> (T, Duration)
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = f.await;
    (out, start.elapsed())
}
