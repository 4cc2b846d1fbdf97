use crate::models::Platform;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    /// Platforms with a registered adapter, in registry order.
    pub platforms: Vec<Platform>,
    pub audit_records: usize,
    pub shutting_down: bool,
}

/// GET /health - Liveness probe
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /ready - 503 until adapters are registered, and again once shutdown begins.
pub async fn ready_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ReadyResponse>) {
    let ready = state.is_ready();
    let body = ReadyResponse {
        status: if ready { "ready" } else { "not_ready" },
        platforms: state.registry.platforms(),
        audit_records: state.audit.len(),
        shutting_down: state.is_shutting_down(),
    };
    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body))
}
