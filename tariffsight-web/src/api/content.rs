//! Public site content endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;

use crate::error::ApiResult;
use crate::services::content;
use crate::AppState;

/// GET /api/content
///
/// The landing-page content blob, served through the read-through
/// cache. Null until an admin has published content.
pub async fn get_content(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let value = content::get_content(&state).await?;
    Ok(Json(json!({ "content": value })))
}

/// Build public content routes
pub fn content_routes() -> Router<AppState> {
    Router::new().route("/api/content", get(get_content))
}
