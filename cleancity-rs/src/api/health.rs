//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" while the classifier is not loaded
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub classifier_ready: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let classifier_ready = state.gateway.is_ready();

    Json(HealthResponse {
        status: if classifier_ready { "ok" } else { "degraded" }.to_string(),
        module: "cleancity-rs".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        classifier_ready,
    })
}

pub fn health_routes() -> axum::Router<AppState> {
    Router::new().route("/health", get(health_check))
}
