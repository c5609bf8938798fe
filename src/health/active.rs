//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend, concurrently
//! - Update backend health state based on results

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::health::state::HealthState;
use crate::load_balancer::{Backend, Registry};
use crate::observability::metrics;

/// Why a single probe did not count as a success.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("failed to build probe request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("connection error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("non-success status {0}")]
    Status(StatusCode),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

pub struct HealthMonitor {
    registry: Arc<Registry>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<Registry>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(HttpConnector::new());

        Self {
            registry,
            config,
            client,
        }
    }

    /// Probe on every interval tick until shutdown is signalled.
    ///
    /// The first cycle starts immediately.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval_ms = self.config.interval_ms,
            timeout_ms = self.config.timeout_ms,
            path = %self.config.path,
            backends = self.registry.len(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.recv() => break,
            }
            tokio::select! {
                _ = self.probe_all() => {}
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Health monitor received shutdown signal, exiting loop");
    }

    /// Run one probe cycle: every backend is checked concurrently.
    pub async fn probe_all(&self) {
        let probes = self
            .registry
            .backends()
            .iter()
            .map(|backend| self.check_backend(backend));
        join_all(probes).await;
    }

    async fn check_backend(&self, backend: &Arc<Backend>) {
        let result = self.probe(backend).await;
        let healthy = result.is_ok();

        if let Err(e) = &result {
            tracing::warn!(backend = %backend.endpoint, error = %e, "Health check failed");
        }

        let previous = backend.set_health(healthy);
        let current = HealthState::from(healthy);
        if previous != current {
            match current {
                HealthState::Unhealthy => {
                    tracing::warn!(backend = %backend.endpoint, from = ?previous, "Backend marked unhealthy")
                }
                _ => tracing::info!(backend = %backend.endpoint, from = ?previous, "Backend marked healthy"),
            }
        } else {
            tracing::trace!(backend = %backend.endpoint, state = ?current, "Health unchanged");
        }

        let label = backend.endpoint.as_str();
        metrics::record_probe(label, healthy);
        metrics::record_backend_health(label, healthy);
    }

    /// Issue one bounded `GET` to the backend's health path.
    pub async fn probe(&self, backend: &Backend) -> Result<(), ProbeFailure> {
        let request = Request::builder()
            .method("GET")
            .uri(backend.endpoint.url_for(&self.config.path))
            .header("user-agent", "lb-proxy-health-check")
            .body(Body::empty())?;

        let timeout = self.config.timeout();
        match time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => Err(ProbeFailure::Status(response.status())),
            Ok(Err(e)) => Err(ProbeFailure::Transport(e)),
            Err(_) => Err(ProbeFailure::Timeout(timeout)),
        }
    }
}
