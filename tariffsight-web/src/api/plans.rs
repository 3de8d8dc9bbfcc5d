//! Public plan catalog with per-user pricing

use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::db::plans;
use crate::entitlement::{price_for, DisplayPrice};
use crate::error::ApiResult;
use crate::models::Plan;
use crate::AppState;

/// Catalog entry as shown on the pricing page
#[derive(Debug, Serialize)]
pub struct PlanView {
    #[serde(flatten)]
    pub plan: Plan,
    /// Effective price for the requesting user (discount-aware)
    pub display_price: DisplayPrice,
}

/// GET /api/plans
///
/// The catalog in display order. Prices reflect the caller's retention
/// discount when one is attached, active and unexpired; guests and
/// undiscounted users see nominal prices.
pub async fn list_plans(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::current_user(&state, &headers).await?;
    let now = Utc::now();

    let views: Vec<PlanView> = plans::list_plans(&state.db)
        .await?
        .into_iter()
        .map(|plan| {
            let display_price = price_for(&plan, user.as_ref(), now);
            PlanView { plan, display_price }
        })
        .collect();

    Ok(Json(json!({ "plans": views })))
}

/// Build plan routes
pub fn plan_routes() -> Router<AppState> {
    Router::new().route("/api/plans", get(list_plans))
}
