//! Admin endpoints
//!
//! Every operation checks its specific permission rather than the role
//! string, so adding finer-grained admin roles later only touches
//! `Role::permissions`.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::db::{plans, users};
use crate::error::{ApiError, ApiResult};
use crate::models::{Permission, Plan, PlanId};
use crate::services::content;
use crate::AppState;

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let admin = super::require_user(&state, &headers).await?;
    super::require_permission(&admin, Permission::ManageUsers)?;

    let users = users::list_users(&state.db).await?;
    Ok(Json(json!({ "users": users })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub plan_id: Option<String>,
    pub credits: Option<i64>,
}

/// PUT /api/admin/users/:email
pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(email): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let admin = super::require_user(&state, &headers).await?;
    super::require_permission(&admin, Permission::ManageUsers)?;

    let plan_id = payload
        .plan_id
        .as_deref()
        .map(|raw| {
            PlanId::try_parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown plan: {}", raw)))
        })
        .transpose()?;

    let touched = users::admin_update_user(&state.db, &email, plan_id, payload.credits)
        .await
        .map_err(|e| match e {
            tariffsight_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => other.into(),
        })?;
    if !touched {
        return Err(ApiError::NotFound(format!("No such user: {}", email)));
    }

    info!(admin = %admin.email, user = %email, "Admin updated user entitlements");

    let updated = users::get_user(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No such user: {}", email)))?;
    Ok(Json(json!({ "user": updated })))
}

/// DELETE /api/admin/users/:email
pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let admin = super::require_user(&state, &headers).await?;
    super::require_permission(&admin, Permission::ManageUsers)?;

    let deleted = users::delete_user(&state.db, &email).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("No such user: {}", email)));
    }

    info!(admin = %admin.email, user = %email, "Admin deleted user");
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct UpsertPlanRequest {
    pub name: String,
    pub price: String,
    pub credits: i64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub popular: bool,
    #[serde(default)]
    pub sort_order: i64,
}

/// PUT /api/admin/plans/:id
pub async fn upsert_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<UpsertPlanRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let admin = super::require_user(&state, &headers).await?;
    super::require_permission(&admin, Permission::ManagePlans)?;

    let plan_id = PlanId::try_parse(&id)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown plan: {}", id)))?;

    if payload.credits < -1 {
        return Err(ApiError::BadRequest(
            "Plan credits must be -1 (unlimited) or >= 0".to_string(),
        ));
    }

    let plan = Plan {
        id: plan_id,
        name: payload.name,
        price: payload.price,
        credits: payload.credits,
        features: payload.features,
        popular: payload.popular,
        sort_order: payload.sort_order,
    };
    plans::upsert_plan(&state.db, &plan).await?;

    info!(admin = %admin.email, plan = plan_id.as_str(), "Admin updated plan catalog");
    Ok(Json(json!({ "plan": plan })))
}

/// GET /api/admin/content
pub async fn get_content(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let admin = super::require_user(&state, &headers).await?;
    super::require_permission(&admin, Permission::ManageContent)?;

    let value = content::get_content(&state).await?;
    Ok(Json(json!({ "content": value })))
}

/// PUT /api/admin/content
pub async fn put_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> ApiResult<Json<serde_json::Value>> {
    let admin = super::require_user(&state, &headers).await?;
    super::require_permission(&admin, Permission::ManageContent)?;

    content::update_content(&state, payload).await?;

    info!(admin = %admin.email, "Admin updated site content");
    Ok(Json(json!({ "success": true })))
}

/// Build admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/:email", put(update_user).delete(delete_user))
        .route("/api/admin/plans/:id", put(upsert_plan))
        .route("/api/admin/content", get(get_content).put(put_content))
}
