//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" while the process serves requests
    pub status: String,
    /// Current time, RFC 3339 UTC
    pub time: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Sessions seen by the last successful poll
    pub live_sessions: usize,
    /// Finished sessions handed to a harvest worker so far
    pub scheduled_harvests: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = Utc::now();
    let uptime_seconds = now
        .signed_duration_since(state.startup_time)
        .num_seconds()
        .max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        time: now.to_rfc3339(),
        module: "plexthumb-agent".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        live_sessions: state.shared.live_sessions().await.len(),
        scheduled_harvests: state.shared.scheduled_count().await,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
