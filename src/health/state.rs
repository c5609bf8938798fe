//! Backend health state.
//!
//! # States
//! - Unknown: never probed; receives traffic
//! - Healthy: last probe succeeded; receives traffic
//! - Unhealthy: excluded from load balancing
//!
//! # State Transitions
//! ```text
//! Unknown → Healthy | Unhealthy: first probe result
//! Healthy ↔ Unhealthy: every probe result overwrites the previous one
//! ```
//!
//! # Design Decisions
//! - Stored as a single `AtomicU8` so readers never observe a torn write
//! - No hysteresis: one probe result decides the state

use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl HealthState {
    /// Whether a backend in this state may be selected.
    pub fn is_eligible(self) -> bool {
        self != HealthState::Unhealthy
    }
}

impl From<bool> for HealthState {
    fn from(healthy: bool) -> Self {
        if healthy {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        }
    }
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// Atomically readable and writable health cell.
#[derive(Debug)]
pub struct AtomicHealth(AtomicU8);

impl AtomicHealth {
    pub fn new() -> Self {
        Self(AtomicU8::new(HealthState::Unknown as u8))
    }

    pub fn load(&self) -> HealthState {
        HealthState::from(self.0.load(Ordering::Acquire))
    }

    /// Store a new state, returning the previous one.
    pub fn swap(&self, state: HealthState) -> HealthState {
        HealthState::from(self.0.swap(state as u8, Ordering::AcqRel))
    }
}

impl Default for AtomicHealth {
    fn default() -> Self {
        Self::new()
    }
}
