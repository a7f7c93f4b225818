//! Health Check API Handler

use axum::{Json, extract::State};
use paperforge_core::dto::health::HealthResponse;

use crate::state::AppState;

/// GET /api/health (also /health)
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Paperforge server is running".to_string(),
        backend_configured: state.config.database_url.is_some(),
    })
}
