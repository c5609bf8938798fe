//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server by its base URL
//! - Track health state (Unknown/Healthy/Unhealthy)
//! - Count consecutive upstream failures for passive health

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;
use url::{Position, Url};

use crate::health::state::{AtomicHealth, HealthState};

/// Reasons a backend URL is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("invalid URL {url:?}: {reason}")]
    Invalid { url: String, reason: String },

    #[error("unsupported scheme {scheme:?} in {url:?} (only http is supported)")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("URL {0:?} has no host")]
    MissingHost(String),

    #[error("URL {0:?} must not carry a path, query or fragment")]
    NotBaseUrl(String),
}

/// Base URL (scheme, host, port) of a backend.
///
/// Identity is the normalized string form, without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendEndpoint {
    base: String,
}

impl BackendEndpoint {
    /// Parse and normalize a backend base URL.
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let url = Url::parse(raw.trim()).map_err(|e| EndpointError::Invalid {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" {
            return Err(EndpointError::UnsupportedScheme {
                url: raw.to_string(),
                scheme: url.scheme().to_string(),
            });
        }
        if url.host_str().is_none() {
            return Err(EndpointError::MissingHost(raw.to_string()));
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(EndpointError::NotBaseUrl(raw.to_string()));
        }

        Ok(Self {
            base: url[..Position::BeforePath].to_string(),
        })
    }

    /// The normalized base URL, e.g. `http://127.0.0.1:5001`.
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Absolute URL for a path-and-query on this backend.
    pub fn url_for(&self, path_and_query: &str) -> String {
        if path_and_query.starts_with('/') {
            format!("{}{}", self.base, path_and_query)
        } else {
            format!("{}/{}", self.base, path_and_query)
        }
    }
}

impl fmt::Display for BackendEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// The backend's base URL.
    pub endpoint: BackendEndpoint,
    /// Current health state.
    health: AtomicHealth,
    /// Consecutive upstream transport failures seen by the proxy handler.
    consecutive_failures: AtomicUsize,
}

impl Backend {
    /// Create a new backend in the `Unknown` state.
    pub fn new(endpoint: BackendEndpoint) -> Self {
        Self {
            endpoint,
            health: AtomicHealth::new(),
            consecutive_failures: AtomicUsize::new(0),
        }
    }

    // --- Health Logic ---

    /// Return true if backend is considered healthy (Healthy or Unknown).
    pub fn is_healthy(&self) -> bool {
        self.health.load().is_eligible()
    }

    pub fn state(&self) -> HealthState {
        self.health.load()
    }

    /// Overwrite the health state, returning the previous one.
    pub fn set_health(&self, healthy: bool) -> HealthState {
        self.health.swap(healthy.into())
    }

    /// Record a failed upstream exchange; returns the new consecutive count.
    pub fn record_failure(&self) -> usize {
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a successful upstream exchange.
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
    }

    pub fn consecutive_failures(&self) -> usize {
        self.consecutive_failures.load(Ordering::Relaxed)
    }
}
