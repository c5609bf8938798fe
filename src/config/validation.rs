//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject malformed or duplicate backend URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::load_balancer::backend::{BackendEndpoint, EndpointError};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("backends[{index}]: {source}")]
    InvalidBackend {
        index: usize,
        #[source]
        source: EndpointError,
    },

    #[error("backends[{index}]: duplicate backend {url}")]
    DuplicateBackend { index: usize, url: String },

    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("health_check.path must start with '/', got {0:?}")]
    InvalidHealthPath(String),

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);

    let mut seen = HashSet::new();
    for (index, backend) in config.backends.iter().enumerate() {
        match BackendEndpoint::parse(&backend.url) {
            Ok(endpoint) => {
                if !seen.insert(endpoint.as_str().to_string()) {
                    errors.push(ValidationError::DuplicateBackend {
                        index,
                        url: endpoint.as_str().to_string(),
                    });
                }
            }
            Err(source) => errors.push(ValidationError::InvalidBackend { index, source }),
        }
    }

    let health = &config.health_check;
    if health.interval_ms == 0 {
        errors.push(ValidationError::ZeroValue { field: "health_check.interval_ms" });
    }
    if health.timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue { field: "health_check.timeout_ms" });
    }
    if !health.path.starts_with('/') {
        errors.push(ValidationError::InvalidHealthPath(health.path.clone()));
    }

    if config.proxy.timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue { field: "proxy.timeout_ms" });
    }
    if config.proxy.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue { field: "proxy.max_body_bytes" });
    }
    if config.proxy.max_response_bytes == 0 {
        errors.push(ValidationError::ZeroValue { field: "proxy.max_response_bytes" });
    }
    if config.passive_health.failure_threshold == 0 {
        errors.push(ValidationError::ZeroValue { field: "passive_health.failure_threshold" });
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.trim().is_empty() {
            errors.push(ValidationError::MissingAdminKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
