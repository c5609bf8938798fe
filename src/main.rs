//! lb-proxy: round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌─────────────────────────────────────────────┐
//!                  │                  LB PROXY                   │
//!   Client ───────▶│  listener ──▶ proxy handler ──▶ selector    │
//!                  │                    │               │        │
//!                  │                    │               ▼        │
//!                  │                    │           registry     │
//!                  │                    │               ▲        │
//!                  │                    ▼               │        │
//!   Client ◀───────│  relay response ◀─ upstream    health       │
//!                  │                    client      monitor      │
//!                  └──────────────────────┼────────────┼─────────┘
//!                                         ▼            ▼
//!                                 proxied request   GET /health
//!                                         Backends
//! ```

use std::process::ExitCode;

use clap::Parser;

use lb_proxy::cli::Cli;
use lb_proxy::lifecycle::startup;
use lb_proxy::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("lb-proxy: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_tracing(&config.observability) {
        eprintln!("lb-proxy: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lb-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = ?config.backends.iter().map(|b| b.url.as_str()).collect::<Vec<_>>(),
        probe_interval_ms = config.health_check.interval_ms,
        probe_timeout_ms = config.health_check.timeout_ms,
        proxy_timeout_ms = config.proxy.timeout_ms,
        "Configuration loaded"
    );

    match startup::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "lb-proxy stopped with error");
            ExitCode::FAILURE
        }
    }
}
