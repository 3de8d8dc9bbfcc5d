//! Integration tests for the subscription lifecycle: purchase,
//! retention offer, discount pricing and cancellation.

mod helpers;

use axum::http::StatusCode;
use helpers::{register, request_json, setup_app, setup_state};
use serde_json::json;
use std::sync::Arc;
use tariffsight_web::build_router;
use tariffsight_web::services::payment::DecliningGateway;
use tariffsight_web::AppState;

#[tokio::test]
async fn purchase_applies_plan_credits_and_invoice() {
    let (app, _state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/subscription/purchase",
        Some(&token),
        Some(json!({ "plan_id": "pro" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["plan_id"], "pro");
    assert_eq!(body["user"]["credits"], -1);
    assert_eq!(body["user"]["subscription_status"], "active");
    assert_eq!(body["invoice"]["amount"], "2.499 TL");
    assert_eq!(body["invoice"]["status"], "paid");

    // The invoice shows up in the billing ledger
    let (status, body) = request_json(&app, "GET", "/api/invoices", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["plan_name"], "Pro");
}

#[tokio::test]
async fn free_plan_cannot_be_purchased() {
    let (app, _state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;

    let (status, _body) = request_json(
        &app,
        "POST",
        "/api/subscription/purchase",
        Some(&token),
        Some(json!({ "plan_id": "free" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_plan_rejected() {
    let (app, _state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;

    let (status, _body) = request_json(
        &app,
        "POST",
        "/api/subscription/purchase",
        Some(&token),
        Some(json!({ "plan_id": "platinum" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn declined_payment_leaves_entitlements_untouched() {
    let state = setup_state().await;
    let state = AppState::with_gateway(
        state.db.clone(),
        state.event_bus.clone(),
        Arc::new(DecliningGateway),
    );
    let app = build_router(state.clone());

    let token = register(&app, "importer@example.com", "Importer").await;

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/subscription/purchase",
        Some(&token),
        Some(json!({ "plan_id": "pro" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"]["code"], "PAYMENT_FAILED");

    // Still on the free tier with the original allotment
    let (_status, body) = request_json(&app, "GET", "/api/profile", Some(&token), None).await;
    assert_eq!(body["user"]["plan_id"], "free");
    assert_eq!(body["user"]["credits"], 3);

    // And no invoice was written
    let (_status, body) = request_json(&app, "GET", "/api/invoices", Some(&token), None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn cancellation_offers_retention_without_mutating() {
    let (app, _state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;
    request_json(
        &app,
        "POST",
        "/api/subscription/purchase",
        Some(&token),
        Some(json!({ "plan_id": "starter" })),
    )
    .await;

    let (status, body) =
        request_json(&app, "POST", "/api/subscription/cancel", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["retention_offer"]["rate"], 0.5);

    // Requesting cancellation changed nothing
    let (_status, body) = request_json(&app, "GET", "/api/profile", Some(&token), None).await;
    assert_eq!(body["user"]["plan_id"], "starter");
    assert_eq!(body["user"]["subscription_status"], "active");
}

#[tokio::test]
async fn retention_accept_attaches_discount_and_prices_next_purchase() {
    let (app, _state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;
    request_json(
        &app,
        "POST",
        "/api/subscription/purchase",
        Some(&token),
        Some(json!({ "plan_id": "starter" })),
    )
    .await;

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/subscription/retention/accept",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Plan and credits unchanged; discount attached
    assert_eq!(body["user"]["plan_id"], "starter");
    assert_eq!(body["user"]["credits"], 30);
    assert_eq!(body["user"]["discount"]["active"], true);
    assert_eq!(body["user"]["discount"]["rate"], 0.5);

    // The pricing page now shows was/now for the discounted user:
    // 2499 * 0.5 = 1249.5, floored to 1249
    let (_status, body) = request_json(&app, "GET", "/api/plans", Some(&token), None).await;
    let plans = body["plans"].as_array().unwrap();
    let pro = plans.iter().find(|p| p["id"] == "pro").unwrap();
    assert_eq!(pro["display_price"]["current"], "1.249 TL");
    assert_eq!(pro["display_price"]["was"], "2.499 TL");

    // Guests keep seeing the nominal price
    let (_status, body) = request_json(&app, "GET", "/api/plans", None, None).await;
    let plans = body["plans"].as_array().unwrap();
    let pro = plans.iter().find(|p| p["id"] == "pro").unwrap();
    assert_eq!(pro["display_price"]["current"], "2.499 TL");
    assert!(pro["display_price"].get("was").is_none());
}

#[tokio::test]
async fn expired_discount_prices_at_nominal() {
    let (app, state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;

    // Discount still flagged active but past its end date
    sqlx::query(
        "UPDATE users SET discount_active = 1, discount_rate = 0.5, discount_ends_at = ? WHERE email = ?",
    )
    .bind((chrono::Utc::now() - chrono::Duration::days(1)).to_rfc3339())
    .bind("importer@example.com")
    .execute(&state.db)
    .await
    .unwrap();

    let (_status, body) = request_json(&app, "GET", "/api/plans", Some(&token), None).await;
    let plans = body["plans"].as_array().unwrap();
    let pro = plans.iter().find(|p| p["id"] == "pro").unwrap();
    assert_eq!(pro["display_price"]["current"], "2.499 TL");
    assert!(pro["display_price"].get("was").is_none());
}

#[tokio::test]
async fn confirmed_cancellation_downgrades_and_is_distinct_from_request() {
    let (app, _state) = setup_app().await;
    let token = register(&app, "importer@example.com", "Importer").await;
    request_json(
        &app,
        "POST",
        "/api/subscription/purchase",
        Some(&token),
        Some(json!({ "plan_id": "pro" })),
    )
    .await;

    // Accept retention first; the discount must not survive a later
    // confirmed cancellation
    request_json(
        &app,
        "POST",
        "/api/subscription/retention/accept",
        Some(&token),
        None,
    )
    .await;

    let (status, body) = request_json(
        &app,
        "POST",
        "/api/subscription/cancel/confirm",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["subscription_status"], "cancelled");
    assert_eq!(body["user"]["plan_id"], "free");
    assert_eq!(body["user"]["credits"], 3);
    assert_eq!(body["user"]["discount"], serde_json::Value::Null);

    // Confirming twice conflicts
    let (status, _body) = request_json(
        &app,
        "POST",
        "/api/subscription/cancel/confirm",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A new purchase reverses the downgrade
    let (status, body) = request_json(
        &app,
        "POST",
        "/api/subscription/purchase",
        Some(&token),
        Some(json!({ "plan_id": "starter" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["subscription_status"], "active");
    assert_eq!(body["user"]["plan_id"], "starter");
    assert_eq!(body["user"]["credits"], 30);
}
