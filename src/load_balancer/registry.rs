//! Backend registry.
//!
//! # Responsibilities
//! - Hold the fixed, ordered list of configured backends
//! - Answer and update per-endpoint health
//! - Provide snapshots for the admin API and logs

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::BackendConfig;
use crate::health::state::HealthState;
use crate::load_balancer::backend::{Backend, BackendEndpoint, EndpointError};

/// Fixed set of backends with their health.
///
/// Membership never changes after construction.
#[derive(Debug, Default)]
pub struct Registry {
    backends: Vec<Arc<Backend>>,
    index: HashMap<BackendEndpoint, usize>,
}

/// Point-in-time view of one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendSnapshot {
    pub url: String,
    pub state: HealthState,
    pub healthy: bool,
    pub consecutive_failures: usize,
}

impl Registry {
    /// Build a registry from endpoints, in rotation order.
    ///
    /// Duplicate endpoints keep their first position.
    pub fn new(endpoints: impl IntoIterator<Item = BackendEndpoint>) -> Self {
        let mut backends = Vec::new();
        let mut index = HashMap::new();

        for endpoint in endpoints {
            if index.contains_key(&endpoint) {
                tracing::warn!(backend = %endpoint, "Duplicate backend ignored");
                continue;
            }
            index.insert(endpoint.clone(), backends.len());
            backends.push(Arc::new(Backend::new(endpoint)));
        }

        Self { backends, index }
    }

    /// Build a registry from backend configuration.
    pub fn from_config(configs: &[BackendConfig]) -> Result<Self, EndpointError> {
        let endpoints = configs
            .iter()
            .map(|c| BackendEndpoint::parse(&c.url))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(endpoints))
    }

    /// All backends in rotation order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn get(&self, endpoint: &BackendEndpoint) -> Option<&Arc<Backend>> {
        self.index.get(endpoint).map(|&i| &self.backends[i])
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Overwrite an endpoint's health.
    ///
    /// Returns the previous state, or `None` if the endpoint is not registered.
    pub fn set_health(&self, endpoint: &BackendEndpoint, healthy: bool) -> Option<HealthState> {
        self.get(endpoint).map(|b| b.set_health(healthy))
    }

    /// Last known health of an endpoint; unregistered endpoints are never healthy.
    pub fn is_healthy(&self, endpoint: &BackendEndpoint) -> bool {
        self.get(endpoint).is_some_and(|b| b.is_healthy())
    }

    pub fn healthy_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_healthy()).count()
    }

    pub fn snapshot(&self) -> Vec<BackendSnapshot> {
        self.backends
            .iter()
            .map(|b| BackendSnapshot {
                url: b.endpoint.to_string(),
                state: b.state(),
                healthy: b.is_healthy(),
                consecutive_failures: b.consecutive_failures(),
            })
            .collect()
    }
}
