//! Analysis submission endpoint and section visibility

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use crate::entitlement::{visibility, ResultSection};
use crate::error::{ApiError, ApiResult};
use crate::models::UserRecord;
use crate::services::analysis::run_analysis;
use crate::AppState;

/// Upload payload: the product photo as base64
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub image_base64: String,
    #[serde(default = "default_filename")]
    pub filename: String,
}

fn default_filename() -> String {
    "upload.jpg".to_string()
}

/// Section visibility map for a user or guest
fn sections_for(user: Option<&UserRecord>) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for section in ResultSection::ALL {
        let vis = visibility(user, section);
        map.insert(
            section.as_str().to_string(),
            serde_json::to_value(vis).unwrap_or(serde_json::Value::Null),
        );
    }
    serde_json::Value::Object(map)
}

/// POST /api/analyze
///
/// Runs the full orchestration: entitlement gate, single-flight claim,
/// classifier call, atomic credit decrement, history append. The credit
/// is only charged after a structurally valid result.
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AnalyzeRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::current_user(&state, &headers).await?;

    let image = base64::engine::general_purpose::STANDARD
        .decode(payload.image_base64.as_bytes())
        .map_err(|e| ApiError::BadRequest(format!("Invalid image encoding: {}", e)))?;
    if image.is_empty() {
        return Err(ApiError::BadRequest("Empty image payload".to_string()));
    }

    let outcome = run_analysis(&state, user.as_ref(), image, &payload.filename).await?;

    Ok(Json(json!({
        "analysis": outcome.record,
        "credits_remaining": outcome.credits_remaining,
        "history_persisted": outcome.history_persisted,
        "sections": sections_for(user.as_ref()),
    })))
}

/// GET /api/sections
///
/// Visibility of each result section for the current user (or guest),
/// so the UI can render locks before any upload happens.
pub async fn get_sections(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::current_user(&state, &headers).await?;
    Ok(Json(json!({ "sections": sections_for(user.as_ref()) })))
}

/// Build analysis routes
pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/sections", get(get_sections))
}
