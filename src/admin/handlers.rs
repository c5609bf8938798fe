use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::load_balancer::BackendSnapshot;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub backends_total: usize,
    pub backends_healthy: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let healthy = state.registry.healthy_count();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if healthy > 0 { "operational" } else { "unavailable" },
        backends_total: state.registry.len(),
        backends_healthy: healthy,
    })
}

pub async fn get_backends(State(state): State<AdminState>) -> Json<Vec<BackendSnapshot>> {
    Json(state.registry.snapshot())
}
