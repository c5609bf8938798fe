//! Round-robin HTTP load balancer library.
//!
//! Requests are spread over a fixed set of backends; a background prober
//! keeps unhealthy backends out of rotation.

pub mod admin;
pub mod cli;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
