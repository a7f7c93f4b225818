//! API Module
//!
//! HTTP API layer of the server.

pub mod error;
pub mod extract;
pub mod health;
pub mod job;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the main router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let files = ServeDir::new(&state.config.storage_dir);
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/upload", post(job::upload).layer(body_limit))
        .route(
            "/generation/{id}",
            get(job::get_generation).delete(job::delete_generation),
        )
        .route("/user/{user_id}/generations", get(job::list_generations));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .nest_service("/files", files)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
