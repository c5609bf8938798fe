//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured bind address
//!     → listener.rs (parse, bind)
//!     → Hand off to HTTP layer (one task per connection)
//!
//! Listener States:
//!     Stopped → Listening → Stopped
//! ```

pub mod listener;

pub use listener::{ListenerError, ListenerState};
