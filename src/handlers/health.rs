//! Liveness and readiness

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: String,
    pub version: &'static str,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, code, database) = match db::check_health(&state.db_pool).await {
        Ok(()) => ("healthy", StatusCode::OK, "connected".to_string()),
        Err(e) => ("unhealthy", StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
