//! Health check handlers

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use super::super::state::AppState;
use super::super::types::HealthResponse;

/// Liveness check
///
/// Always 200 while the process is serving requests.
#[utoipa::path(
    get,
    path = "/health/liveness",
    responses(
        (status = 200, description = "Process alive", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse::new("ok"))
}

/// Readiness check
///
/// Pings the credential store. Failure details are logged, not returned.
#[utoipa::path(
    get,
    path = "/health/readiness",
    responses(
        (status = 200, description = "Store reachable", body = HealthResponse),
        (status = 503, description = "Store unavailable", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn readiness(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    match state.authenticator.store().health_check().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::new("ok"))),
        Err(e) => {
            tracing::error!(error = %e, "[HEALTH] Store ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::new("unavailable")),
            )
        }
    }
}
