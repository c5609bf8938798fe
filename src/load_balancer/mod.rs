//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Request arrives at the proxy handler
//!     → selector.rs (pair registry with algorithm)
//!     → registry.rs (fixed backend list + health)
//!     → round_robin.rs (rotate through backends, skip unhealthy)
//!     → Return backend or None (no healthy backend)
//! ```
//!
//! # Design Decisions
//! - Registry membership is fixed at startup
//! - Health lives on each backend as an atomic, written by the prober
//! - Unhealthy backends excluded from selection
//! - Selection never blocks and never holds a lock

pub mod backend;
pub mod registry;
pub mod round_robin;
pub mod selector;

use std::sync::Arc;

/// A backend selection algorithm.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the next eligible backend, or `None` if none is eligible.
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>>;
}

pub use backend::{Backend, BackendEndpoint};
pub use registry::{BackendSnapshot, Registry};
pub use selector::Selector;
