//! Profile and verification endpoints

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tariffsight_common::events::AppEvent;

use crate::db::{invoices, users};
use crate::error::{ApiError, ApiResult};
use crate::models::VerificationChannel;
use crate::AppState;

/// GET /api/profile
pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::require_user(&state, &headers).await?;
    Ok(Json(json!({ "user": user })))
}

/// GET /api/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::require_user(&state, &headers).await?;
    let items = invoices::list(&state.db, &user.email).await?;
    Ok(Json(json!({ "items": items })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub channel: VerificationChannel,
}

/// POST /api/profile/verify
///
/// Marks a verification channel complete and grants the one-time bonus
/// credit. Re-verifying an already-verified channel is a no-op; the
/// response reports whether a grant actually happened.
pub async fn verify_channel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<VerifyRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::require_user(&state, &headers).await?;

    let granted =
        users::grant_verification_credit(&state.db, &user.email, payload.channel).await?;

    let updated = users::get_user(&state.db, &user.email)
        .await?
        .ok_or_else(|| ApiError::Internal("User vanished during verification".to_string()))?;

    if granted {
        tracing::info!(email = %user.email, channel = ?payload.channel, "Verification credit granted");
        state.event_bus.emit_lossy(AppEvent::CreditsChanged {
            email: updated.email.clone(),
            credits: updated.credits,
            timestamp: Utc::now(),
        });
    }

    Ok(Json(json!({ "granted": granted, "user": updated })))
}

/// Build profile routes
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/api/profile", get(get_profile))
        .route("/api/profile/verify", post(verify_channel))
        .route("/api/invoices", get(list_invoices))
}
