//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, catch-all route)
//!     → proxy.rs (select backend, forward, relay)
//!     → request.rs (request ID, strip hop-by-hop headers, upstream request)
//!     → response.rs (relay response, map failures to 502/503)
//!     → Send to client
//! ```

pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::ProxyError;
pub use server::{AppState, HttpServer};
