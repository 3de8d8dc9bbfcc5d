//! Analysis history endpoints

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{delete, get},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::db::history;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/history
///
/// The caller's analyses, most recent first.
pub async fn list_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::require_user(&state, &headers).await?;
    let items = history::list(&state.db, &user.email).await?;
    Ok(Json(json!({ "items": items })))
}

/// DELETE /api/history/:id
///
/// Owner-scoped delete; a foreign or unknown id is a plain 404.
pub async fn delete_history_item(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::require_user(&state, &headers).await?;

    let deleted = history::delete(&state.db, &user.email, id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("No analysis with id {}", id)));
    }

    Ok(Json(json!({ "success": true })))
}

/// Build history routes
pub fn history_routes() -> Router<AppState> {
    Router::new()
        .route("/api/history", get(list_history))
        .route("/api/history/:id", delete(delete_history_item))
}
