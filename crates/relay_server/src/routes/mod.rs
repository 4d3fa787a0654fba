mod hf;
mod notifications;
mod sources;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// Builds the full API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/sources/resolve", get(sources::resolve))
        .route("/api/v1/sources/proxy", get(sources::proxy))
        .route("/api/v1/sources/download", post(sources::start_download))
        .route("/api/v1/sources/downloads", get(sources::list_downloads))
        .route(
            "/api/v1/sources/download/{id}",
            get(sources::get_download).delete(sources::cancel_download),
        )
        .route("/api/hf/search", get(hf::search))
        .route("/api/hf/download/{repo_id}/{revision}", get(hf::download))
        .route("/api/v1/notifications", get(notifications::list))
        .route(
            "/api/v1/notifications/{id}/read",
            post(notifications::mark_read),
        )
        .route(
            "/api/v1/notifications/read-all",
            post(notifications::mark_all_read),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

/// Admission check shared by the sources and hf route groups.
pub(crate) fn enforce_rate_limit(state: &AppState, ip: &str) -> Result<(), ApiError> {
    if state.limiter.check(ip).is_allowed() {
        Ok(())
    } else {
        Err(ApiError::RateLimited)
    }
}
