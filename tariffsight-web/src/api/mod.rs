//! HTTP API handlers for tariffsight-web
//!
//! One module per domain area; routers are merged in `build_router`.

pub mod admin;
pub mod analysis;
pub mod auth;
pub mod content;
pub mod health;
pub mod history;
pub mod plans;
pub mod profile;
pub mod sse;
pub mod subscription;

pub use admin::admin_routes;
pub use analysis::analysis_routes;
pub use auth::auth_routes;
pub use content::content_routes;
pub use health::health_routes;
pub use history::history_routes;
pub use plans::plan_routes;
pub use profile::profile_routes;
pub use sse::event_stream;
pub use subscription::subscription_routes;

use axum::http::HeaderMap;

use crate::db::{sessions, users};
use crate::error::{ApiError, ApiResult};
use crate::models::{Permission, UserRecord};
use crate::AppState;

/// Extract the bearer token from the Authorization header
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

/// Resolve the current user, if any
///
/// Guests are a normal case (None), not an error: several endpoints
/// serve them with reduced visibility.
pub(crate) async fn current_user(
    state: &AppState,
    headers: &HeaderMap,
) -> ApiResult<Option<UserRecord>> {
    let Some(token) = bearer_token(headers) else {
        return Ok(None);
    };

    let Some(email) = sessions::lookup_session(&state.db, &token).await? else {
        return Ok(None);
    };

    Ok(users::get_user(&state.db, &email).await?)
}

/// Resolve the current user or fail with 401
pub(crate) async fn require_user(state: &AppState, headers: &HeaderMap) -> ApiResult<UserRecord> {
    current_user(state, headers)
        .await?
        .ok_or(ApiError::AuthRequired)
}

/// Check a specific admin capability
pub(crate) fn require_permission(user: &UserRecord, permission: Permission) -> ApiResult<()> {
    if user.role.has_permission(permission) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Missing permission: {:?}",
            permission
        )))
    }
}
