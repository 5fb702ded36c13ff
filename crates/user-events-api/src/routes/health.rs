//! Health check endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use serde::Serialize;
use user_events_core::repository::{HealthReport, HealthStatus};

use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status: `ok` or `degraded`.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Store reachability and pool statistics.
    pub database: HealthReport,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.store_health.health().await;
    let (code, status) = match database.status {
        HealthStatus::Up => (StatusCode::OK, "ok"),
        HealthStatus::Down => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
        }),
    )
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
