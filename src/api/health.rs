//! Health check endpoint handler.

use crate::api::{AppState, HealthResponse};
use axum::{extract::State, Json};
use std::sync::Arc;

/// GET /health - Liveness and upstream configuration summary.
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: state.gateway.model().to_string(),
        credential_configured: state.gateway.credential_configured(),
    })
}
