//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{backend::Backend, LoadBalancer};

/// Round-robin selector.
///
/// The cursor is shared by every caller and advances once per candidate
/// examined, so an unhealthy backend still consumes a turn.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cursor position (always below the backend count once used).
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Return the cursor's value and advance it by one, wrapping at `len`.
    fn advance(&self, len: usize) -> usize {
        // The closure always returns Some, so both arms carry the previous value.
        let prev = match self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| Some((c + 1) % len))
        {
            Ok(prev) | Err(prev) => prev,
        };
        prev % len
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        let len = backends.len();
        if len == 0 {
            return None;
        }

        for _ in 0..len {
            let backend = &backends[self.advance(len)];
            if backend.is_healthy() {
                return Some(backend.clone());
            }
        }
        None
    }
}
