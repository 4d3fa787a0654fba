use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/v1/notifications
pub(super) async fn list(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let items = state.notifications.list();
    let unread = state.notifications.unread_count();
    Json(json!({ "unread": unread, "items": items }))
}

/// POST /api/v1/notifications/{id}/read
pub(super) async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.notifications.mark_read(id) {
        Ok(Json(json!({ "read": true, "id": id })))
    } else {
        Err(ApiError::NotFound("notification"))
    }
}

/// POST /api/v1/notifications/read-all
pub(super) async fn mark_all_read(
    State(state): State<Arc<AppState>>,
) -> Json<serde_json::Value> {
    let changed = state.notifications.mark_all_read();
    Json(json!({ "read": changed }))
}
