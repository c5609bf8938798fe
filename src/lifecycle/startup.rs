//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start background tasks (health checks, metrics, admin API)
//! - Bind listeners and begin accepting traffic
//! - Stop everything when the shutdown signal fires
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::admin::{setup_admin_router, AdminState};
use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::load_balancer::backend::EndpointError;
use crate::net::{listener, ListenerError};
use crate::observability::metrics;

/// Errors that abort startup or serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("invalid backend: {0}")]
    Backend(#[from] EndpointError),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid address {address:?}: {source}")]
    Address {
        address: String,
        source: std::net::AddrParseError,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

fn parse_addr(address: &str) -> Result<SocketAddr, StartupError> {
    address.parse().map_err(|source| StartupError::Address {
        address: address.to_string(),
        source,
    })
}

/// Run the proxy until a termination signal arrives.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();
    let signal_task = signals::spawn_signal_handler(shutdown.clone());
    let result = run_until(config, shutdown).await;
    signal_task.abort();
    result
}

/// Run the proxy until `shutdown` is triggered.
pub async fn run_until(config: ProxyConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(parse_addr(&config.observability.metrics_address)?)?;
    }

    let server = HttpServer::new(config.clone())?;
    let proxy_listener = listener::bind(&config.listener).await?;

    let admin_task = if config.admin.enabled {
        let admin_listener = listener::bind_addr(parse_addr(&config.admin.bind_address)?).await?;
        let router = setup_admin_router(AdminState {
            registry: server.registry().clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        });
        let mut admin_shutdown = shutdown.subscribe();
        tracing::info!(address = %config.admin.bind_address, "Admin API listening");
        Some(tokio::spawn(async move {
            let served = axum::serve(admin_listener, router)
                .with_graceful_shutdown(async move {
                    let _ = admin_shutdown.recv().await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin API stopped with error");
            }
        }))
    } else {
        None
    };

    let result = server.run(proxy_listener, shutdown.subscribe()).await;

    if let Some(task) = admin_task {
        shutdown.trigger();
        let _ = task.await;
    }

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}
