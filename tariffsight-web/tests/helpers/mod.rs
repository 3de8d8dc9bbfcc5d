//! Shared test helpers: in-memory app construction and request plumbing
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tariffsight_common::events::EventBus;
use tariffsight_web::{build_router, AppState};
use tower::ServiceExt;

/// Build an AppState over a fresh in-memory database
///
/// Single connection so every request sees the same in-memory database.
pub async fn setup_state() -> AppState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    tariffsight_common::db::init::create_tables(&pool).await.unwrap();
    tariffsight_common::db::init::seed_default_plans(&pool).await.unwrap();

    AppState::new(pool, EventBus::new(100))
}

pub async fn setup_app() -> (Router, AppState) {
    let state = setup_state().await;
    (build_router(state.clone()), state)
}

/// Send a JSON request, return status and parsed body
pub async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };

    (status, json)
}

/// Register a user through the API and return their bearer token
pub async fn register(app: &Router, email: &str, name: &str) -> String {
    let (status, body) = request_json(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(serde_json::json!({
            "email": email,
            "name": name,
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "signup failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Promote a user to admin directly in the store
pub async fn promote_to_admin(pool: &SqlitePool, email: &str) {
    sqlx::query("UPDATE users SET role = 'admin' WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await
        .unwrap();
}

/// Set a user's credit balance directly in the store
pub async fn set_credits(pool: &SqlitePool, email: &str, credits: i64) {
    sqlx::query("UPDATE users SET credits = ? WHERE email = ?")
        .bind(credits)
        .bind(email)
        .execute(pool)
        .await
        .unwrap();
}
