//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe every backend concurrently
//!     → Update state.rs
//!
//! Passive health checks (passive.rs, opt-in):
//!     Upstream transport failure observed
//!     → Increment failure count
//!     → Mark unhealthy if threshold exceeded
//!
//! State (state.rs):
//!     Unknown → Healthy ←→ Unhealthy
//! ```
//!
//! # Design Decisions
//! - The prober is the only component that marks a backend healthy
//! - One slow backend never delays probes of the others
//! - Health state is per-backend

pub mod active;
pub mod passive;
pub mod state;

pub use active::HealthMonitor;
pub use passive::PassiveHealth;
pub use state::HealthState;
