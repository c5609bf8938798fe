//! Passive health checking (failure detection).
//!
//! # Responsibilities
//! - Observe upstream exchange outcomes from the proxy handler
//! - Track consecutive transport failures per backend
//! - Demote a backend once the threshold is reached (when enabled)
//!
//! # Design Decisions
//! - Disabled by default; the active prober is then the only writer
//! - Only transport failures count; any upstream HTTP status is a success
//! - Never promotes a backend; recovery is left to the prober

use crate::config::PassiveHealthConfig;
use crate::load_balancer::Backend;
use crate::observability::metrics;

#[derive(Debug, Clone)]
pub struct PassiveHealth {
    enabled: bool,
    failure_threshold: usize,
}

impl PassiveHealth {
    pub fn new(config: &PassiveHealthConfig) -> Self {
        Self {
            enabled: config.enabled,
            failure_threshold: config.failure_threshold.max(1) as usize,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn report_success(&self, backend: &Backend) {
        backend.record_success();
    }

    /// Count a transport failure; returns true if the backend was demoted.
    pub fn report_failure(&self, backend: &Backend) -> bool {
        let failures = backend.record_failure();
        if !self.enabled || failures < self.failure_threshold || !backend.is_healthy() {
            return false;
        }

        backend.set_health(false);
        metrics::record_backend_health(backend.endpoint.as_str(), false);
        tracing::warn!(
            backend = %backend.endpoint,
            consecutive_failures = failures,
            "Backend demoted after consecutive upstream failures"
        );
        true
    }
}
