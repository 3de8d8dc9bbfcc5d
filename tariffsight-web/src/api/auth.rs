//! Authentication endpoints: signup, signin, signout, session lookup

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tariffsight_common::events::AppEvent;
use tracing::info;

use crate::db::{sessions, users};
use crate::error::{ApiError, ApiResult};
use crate::models::UserRecord;
use crate::services::auth::{hash_password, is_valid_email, is_valid_password, verify_password};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Session response carrying the bearer token and the fresh user record
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserRecord,
}

/// POST /api/auth/signup
///
/// Creates the default free-tier entitlement record and opens a session.
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let email = payload.email.trim().to_lowercase();

    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if !is_valid_password(&payload.password) {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
    }

    let user = users::create_user(
        &state.db,
        &email,
        payload.name.trim(),
        &hash_password(&payload.password),
    )
    .await
    .map_err(|e| match e {
        tariffsight_common::Error::InvalidInput(msg) => ApiError::Conflict(msg),
        other => other.into(),
    })?;

    let token = sessions::create_session(&state.db, &email).await?;

    info!(%email, "New account registered");
    state.event_bus.emit_lossy(AppEvent::SessionChanged {
        email: email.clone(),
        signed_in: true,
        timestamp: Utc::now(),
    });

    Ok(Json(SessionResponse { token, user }))
}

/// POST /api/auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let email = payload.email.trim().to_lowercase();

    let stored = users::get_password_hash(&state.db, &email).await?;
    let valid = stored
        .map(|hash| verify_password(&payload.password, &hash))
        .unwrap_or(false);

    if !valid {
        // Same response for unknown email and wrong password
        return Err(ApiError::BadRequest("Invalid credentials".to_string()));
    }

    let user = users::get_user(&state.db, &email)
        .await?
        .ok_or(ApiError::AuthRequired)?;
    let token = sessions::create_session(&state.db, &email).await?;

    state.event_bus.emit_lossy(AppEvent::SessionChanged {
        email: email.clone(),
        signed_in: true,
        timestamp: Utc::now(),
    });

    Ok(Json(SessionResponse { token, user }))
}

/// POST /api/auth/signout
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    if let Some(token) = super::bearer_token(&headers) {
        if let Some(email) = sessions::lookup_session(&state.db, &token).await? {
            sessions::delete_session(&state.db, &token).await?;
            state.event_bus.emit_lossy(AppEvent::SessionChanged {
                email,
                signed_in: false,
                timestamp: Utc::now(),
            });
        }
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// GET /api/auth/session
///
/// Returns the current user record, or null for guests. The UI keeps
/// its in-memory profile synchronized from this plus the SSE stream.
pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let user = super::current_user(&state, &headers).await?;
    Ok(Json(serde_json::json!({ "user": user })))
}

/// Build authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/signin", post(sign_in))
        .route("/api/auth/signout", post(sign_out))
        .route("/api/auth/session", get(get_session))
}
