//! Integration tests for the entitlement gate, section visibility and
//! verification credit grants, driven through the HTTP surface.

mod helpers;

use axum::http::StatusCode;
use helpers::{register, request_json, set_credits, setup_app};
use serde_json::json;

#[tokio::test]
async fn signup_creates_default_entitlement_record() {
    let (app, _state) = setup_app().await;

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "email": "importer@example.com",
            "name": "Importer",
            "password": "hunter2hunter2",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let user = &body["user"];
    assert_eq!(user["plan_id"], "free");
    assert_eq!(user["credits"], 3);
    assert_eq!(user["subscription_status"], "active");
    assert_eq!(user["email_verified"], false);
    assert_eq!(user["phone_verified"], false);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let (app, _state) = setup_app().await;
    register(&app, "importer@example.com", "Importer").await;

    let (status, _body) = request_json(
        &app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({
            "email": "importer@example.com",
            "name": "Again",
            "password": "hunter2hunter2",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn guest_sections_lock_behind_login() {
    let (app, _state) = setup_app().await;

    let (status, body) = request_json(&app, "GET", "/api/sections", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let sections = &body["sections"];
    assert_eq!(sections["basic_classification"]["state"], "visible");
    assert_eq!(sections["taxes_and_documents"]["state"], "locked");
    assert_eq!(
        sections["taxes_and_documents"]["locked_behind"]["target"],
        "login"
    );
    assert_eq!(
        sections["market_price_analysis"]["locked_behind"]["target"],
        "login"
    );
}

#[tokio::test]
async fn free_user_sections_lock_behind_upgrade_not_login() {
    let (app, _state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;

    let (status, body) = request_json(&app, "GET", "/api/sections", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let sections = &body["sections"];
    assert_eq!(sections["taxes_and_documents"]["state"], "visible");

    // Authenticated-but-insufficient-tier resolves to an upgrade prompt,
    // never a login prompt
    let market = &sections["market_price_analysis"];
    assert_eq!(market["state"], "locked");
    assert_eq!(market["locked_behind"]["target"], "upgrade");
    assert_eq!(market["locked_behind"]["plan"], "pro");
}

#[tokio::test]
async fn analyze_as_guest_requires_auth() {
    let (app, _state) = setup_app().await;

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/analyze",
        None,
        Some(json!({ "image_base64": "aGVsbG8=" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn analyze_with_zero_credits_denied_before_any_network_call() {
    let (app, state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;
    set_credits(&state.db, "importer@example.com", 0).await;

    // The classifier endpoint is deliberately unconfigured: reaching it
    // would produce a 500, so the 402 proves the gate fired first.
    let (status, body) = request_json(
        &app,
        "POST",
        "/api/analyze",
        Some(&token),
        Some(json!({ "image_base64": "aGVsbG8=" })),
    )
    .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"]["code"], "CREDITS_EXHAUSTED");

    // No history entry was created
    let (status, body) = request_json(&app, "GET", "/api/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn analyze_with_cancelled_subscription_denied() {
    let (app, state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;

    sqlx::query("UPDATE users SET subscription_status = 'cancelled' WHERE email = ?")
        .bind("importer@example.com")
        .execute(&state.db)
        .await
        .unwrap();

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/analyze",
        Some(&token),
        Some(json!({ "image_base64": "aGVsbG8=" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "SUBSCRIPTION_INACTIVE");
}

#[tokio::test]
async fn failed_classification_never_charges() {
    let (app, state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;

    // Classifier unconfigured: the call fails after the gate, before any
    // credit mutation
    let (status, _body) = request_json(
        &app,
        "POST",
        "/api/analyze",
        Some(&token),
        Some(json!({ "image_base64": "aGVsbG8=" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let credits: i64 = sqlx::query_scalar("SELECT credits FROM users WHERE email = ?")
        .bind("importer@example.com")
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(credits, 3, "A failed attempt must not consume a credit");
}

#[tokio::test]
async fn verification_grants_one_credit_idempotently() {
    let (app, _state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/profile/verify",
        Some(&token),
        Some(json!({ "channel": "email" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], true);
    assert_eq!(body["user"]["credits"], 4);
    assert_eq!(body["user"]["email_verified"], true);

    // Re-verifying the same channel is a no-op
    let (status, body) = request_json(
        &app,
        "POST",
        "/api/profile/verify",
        Some(&token),
        Some(json!({ "channel": "email" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], false);
    assert_eq!(body["user"]["credits"], 4);

    // The other channel still grants
    let (_status, body) = request_json(
        &app,
        "POST",
        "/api/profile/verify",
        Some(&token),
        Some(json!({ "channel": "phone" })),
    )
    .await;
    assert_eq!(body["granted"], true);
    assert_eq!(body["user"]["credits"], 5);
}

#[tokio::test]
async fn unlimited_account_stays_unlimited_through_verification() {
    let (app, state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;
    set_credits(&state.db, "importer@example.com", -1).await;

    let (_status, body) = request_json(
        &app,
        "POST",
        "/api/profile/verify",
        Some(&token),
        Some(json!({ "channel": "email" })),
    )
    .await;
    assert_eq!(body["granted"], true);
    assert_eq!(body["user"]["credits"], -1);
}

#[tokio::test]
async fn session_lifecycle() {
    let (app, _state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;

    // Session resolves to the user
    let (status, body) = request_json(&app, "GET", "/api/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "importer@example.com");

    // Sign out kills the session
    let (status, _body) =
        request_json(&app, "POST", "/api/auth/signout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request_json(&app, "GET", "/api/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], serde_json::Value::Null);
}

#[tokio::test]
async fn signin_rejects_bad_credentials_uniformly() {
    let (app, _state) = setup_app().await;
    register(&app, "importer@example.com", "Importer").await;

    let (wrong_pw, _) = request_json(
        &app,
        "POST",
        "/api/auth/signin",
        None,
        Some(json!({ "email": "importer@example.com", "password": "not-the-password" })),
    )
    .await;
    let (unknown, _) = request_json(
        &app,
        "POST",
        "/api/auth/signin",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "whatever123" })),
    )
    .await;

    assert_eq!(wrong_pw, StatusCode::BAD_REQUEST);
    assert_eq!(unknown, StatusCode::BAD_REQUEST);
}
