//! Backend selection over the registry.
//!
//! # Responsibilities
//! - Pair the shared registry with a load balancing algorithm
//! - Yield the next eligible backend or report total unavailability

use std::sync::Arc;

use crate::load_balancer::{
    backend::Backend, registry::Registry, round_robin::RoundRobin, LoadBalancer,
};

/// Picks backends for incoming requests.
#[derive(Debug)]
pub struct Selector {
    registry: Arc<Registry>,
    strategy: Box<dyn LoadBalancer>,
}

impl Selector {
    /// Round-robin selector over the given registry.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_strategy(registry, Box::new(RoundRobin::new()))
    }

    pub fn with_strategy(registry: Arc<Registry>, strategy: Box<dyn LoadBalancer>) -> Self {
        Self { registry, strategy }
    }

    /// Next healthy backend, or `None` when no backend is eligible.
    pub fn next(&self) -> Option<Arc<Backend>> {
        let selected = self.strategy.next_server(self.registry.backends());
        if selected.is_none() {
            tracing::debug!(
                backend_count = self.registry.len(),
                "No healthy backends found"
            );
            for b in self.registry.backends() {
                tracing::debug!(backend = %b.endpoint, state = ?b.state(), "Backend status");
            }
        }
        selected
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}
