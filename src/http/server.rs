//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, body limit, request ID)
//! - Spawn the health monitor next to the server
//! - Serve until the shutdown signal, then stop the monitor

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, extract::DefaultBodyLimit, routing::any, Router};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::health::{HealthMonitor, PassiveHealth};
use crate::http::proxy::proxy_handler;
use crate::http::request::X_REQUEST_ID;
use crate::lifecycle::Shutdown;
use crate::load_balancer::backend::EndpointError;
use crate::load_balancer::{Registry, Selector};
use crate::net::ListenerState;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub selector: Arc<Selector>,
    pub client: Client<HttpConnector, Body>,
    pub proxy_timeout: Duration,
    pub max_response_bytes: usize,
    pub passive_health: PassiveHealth,
}

/// HTTP server for the load-balancing proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    registry: Arc<Registry>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, EndpointError> {
        let registry = Arc::new(Registry::from_config(&config.backends)?);
        Ok(Self::with_registry(config, registry))
    }

    /// Create a server over an existing registry.
    pub fn with_registry(config: ProxyConfig, registry: Arc<Registry>) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(HttpConnector::new());

        let state = AppState {
            selector: Arc::new(Selector::new(registry.clone())),
            client,
            proxy_timeout: config.proxy.timeout(),
            max_response_bytes: config.proxy.max_response_bytes,
            passive_health: PassiveHealth::new(&config.passive_health),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            registry,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.proxy.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// The router, for driving the proxy without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;

        if self.registry.is_empty() {
            tracing::warn!("No backends configured; every request will get 503");
        }

        // The monitor stops after serving ends, even if `shutdown` fired before this ran.
        let monitor_stop = Shutdown::new();
        let monitor = HealthMonitor::new(self.registry.clone(), self.config.health_check.clone());
        let monitor_handle = tokio::spawn(monitor.run(monitor_stop.subscribe()));

        tracing::info!(
            address = %addr,
            backends = self.registry.len(),
            state = ?ListenerState::Listening,
            "HTTP server starting"
        );

        let result = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await;

        monitor_stop.trigger();
        let _ = monitor_handle.await;

        tracing::info!(address = %addr, state = ?ListenerState::Stopped, "HTTP server stopped");
        result
    }
}
