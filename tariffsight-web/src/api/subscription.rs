//! Subscription lifecycle endpoints
//!
//! Cancellation is two distinct calls: `/cancel` only returns the
//! retention offer; the destructive downgrade happens exclusively at
//! `/cancel/confirm`.

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, ApiResult};
use crate::models::{PlanId, SubscriptionStatus};
use crate::services::subscription;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub plan_id: String,
}

/// POST /api/subscription/purchase
pub async fn purchase(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PurchaseRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::require_user(&state, &headers).await?;

    let plan_id = PlanId::try_parse(&payload.plan_id)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown plan: {}", payload.plan_id)))?;

    let (updated, invoice) = subscription::purchase(&state, &user, plan_id).await?;

    Ok(Json(json!({ "user": updated, "invoice": invoice })))
}

/// POST /api/subscription/cancel
///
/// First step of the cancellation flow: presents the retention offer
/// and mutates nothing.
pub async fn request_cancellation(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::require_user(&state, &headers).await?;

    if user.subscription_status == SubscriptionStatus::Cancelled {
        return Err(ApiError::Conflict(
            "Subscription is already cancelled".to_string(),
        ));
    }

    let offer = subscription::retention_offer(Utc::now());
    Ok(Json(json!({ "retention_offer": offer })))
}

/// POST /api/subscription/retention/accept
pub async fn accept_retention(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::require_user(&state, &headers).await?;
    let updated = subscription::accept_retention(&state, &user).await?;
    Ok(Json(json!({ "user": updated })))
}

/// POST /api/subscription/cancel/confirm
///
/// The explicit, destructive confirmation. Downgrades to free and
/// resets credits; irreversible except via a new purchase.
pub async fn confirm_cancellation(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::require_user(&state, &headers).await?;
    let updated = subscription::confirm_cancellation(&state, &user).await?;
    Ok(Json(json!({ "user": updated })))
}

/// Build subscription routes
pub fn subscription_routes() -> Router<AppState> {
    Router::new()
        .route("/api/subscription/purchase", post(purchase))
        .route("/api/subscription/cancel", post(request_cancellation))
        .route("/api/subscription/retention/accept", post(accept_retention))
        .route("/api/subscription/cancel/confirm", post(confirm_cancellation))
}
