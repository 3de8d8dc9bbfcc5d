//! Subscription lifecycle
//!
//! `Free -> Active(plan) -> Cancelled -> Free`, with the retention
//! branch `Active --offer--> DiscountPending --accept--> Active(discounted)
//! | --decline/confirm--> Cancelled`.
//!
//! A cancellation request only ever returns the retention offer; the
//! destructive downgrade requires a separate explicit confirmation call,
//! so a retention-accepted state is never one click from cancellation.

use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use tariffsight_common::events::AppEvent;
use uuid::Uuid;

use crate::db::{invoices, plans, users};
use crate::entitlement::price_for;
use crate::error::{ApiError, ApiResult};
use crate::models::{Invoice, PlanId, SubscriptionStatus, UserRecord};
use crate::AppState;

/// Retention policy: 50% off for 3 months
pub const RETENTION_DISCOUNT_RATE: f64 = 0.5;
pub const RETENTION_DISCOUNT_MONTHS: u32 = 3;

/// Offer presented when a user asks to cancel
#[derive(Debug, Clone, Serialize)]
pub struct RetentionOffer {
    pub rate: f64,
    pub ends_at: DateTime<Utc>,
    pub message: String,
}

/// Build the retention offer shown before any cancellation is finalized
pub fn retention_offer(now: DateTime<Utc>) -> RetentionOffer {
    RetentionOffer {
        rate: RETENTION_DISCOUNT_RATE,
        ends_at: discount_end(now),
        message: format!(
            "Stay with us and get {}% off your next plan purchase for the next {} months.",
            (RETENTION_DISCOUNT_RATE * 100.0) as u32,
            RETENTION_DISCOUNT_MONTHS
        ),
    }
}

fn discount_end(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_add_months(Months::new(RETENTION_DISCOUNT_MONTHS))
        .unwrap_or(now + chrono::Duration::days(90))
}

/// Purchase a plan
///
/// Charges the discounted price when a fresh retention discount is
/// attached, then applies the plan, resets the credit allotment,
/// reactivates the subscription and appends an invoice. The discount is
/// consumed by the purchase.
pub async fn purchase(
    state: &AppState,
    user: &UserRecord,
    plan_id: PlanId,
) -> ApiResult<(UserRecord, Invoice)> {
    if plan_id == PlanId::Free {
        return Err(ApiError::BadRequest(
            "The free tier cannot be purchased".to_string(),
        ));
    }

    let plan = plans::get_plan(&state.db, plan_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Unknown plan: {}", plan_id.as_str())))?;

    // Discount freshness is checked here, at the point of use
    let price = price_for(&plan, Some(user), Utc::now());

    let receipt = state
        .payments
        .confirm_payment(plan_id, &price.current, &user.email)
        .await
        .map_err(|e| ApiError::Payment(e.to_string()))?;

    users::apply_plan_purchase(&state.db, &user.email, plan_id, plan.credits).await?;

    let invoice = Invoice {
        id: Uuid::new_v4(),
        email: user.email.clone(),
        plan_name: plan.name.clone(),
        amount: receipt.amount.clone(),
        status: "paid".to_string(),
        created_at: Utc::now(),
    };
    invoices::append(&state.db, &invoice).await?;

    let updated = users::get_user(&state.db, &user.email)
        .await?
        .ok_or_else(|| ApiError::Internal("User vanished during purchase".to_string()))?;

    tracing::info!(
        email = %user.email,
        plan = plan_id.as_str(),
        amount = %receipt.amount,
        reference = %receipt.reference,
        "Plan purchased"
    );

    state.event_bus.emit_lossy(AppEvent::PlanChanged {
        email: updated.email.clone(),
        plan_id: plan_id.as_str().to_string(),
        timestamp: Utc::now(),
    });
    state.event_bus.emit_lossy(AppEvent::CreditsChanged {
        email: updated.email.clone(),
        credits: updated.credits,
        timestamp: Utc::now(),
    });

    Ok((updated, invoice))
}

/// Accept the retention offer: attach the discount, keep everything else
///
/// Plan and credits are unchanged by design; the discount prices the
/// next purchase only.
pub async fn accept_retention(state: &AppState, user: &UserRecord) -> ApiResult<UserRecord> {
    if user.subscription_status != SubscriptionStatus::Active {
        return Err(ApiError::SubscriptionInactive);
    }

    let ends_at = discount_end(Utc::now());
    let attached =
        users::attach_discount(&state.db, &user.email, RETENTION_DISCOUNT_RATE, ends_at).await?;
    if !attached {
        return Err(ApiError::Conflict(
            "Retention offer is only available on an active subscription".to_string(),
        ));
    }

    tracing::info!(email = %user.email, %ends_at, "Retention discount attached");

    users::get_user(&state.db, &user.email)
        .await?
        .ok_or_else(|| ApiError::Internal("User vanished during retention".to_string()))
}

/// Confirm the cancellation: downgrade to free, reset credits
///
/// Destructive and irreversible except via a new purchase.
pub async fn confirm_cancellation(state: &AppState, user: &UserRecord) -> ApiResult<UserRecord> {
    if user.subscription_status == SubscriptionStatus::Cancelled {
        return Err(ApiError::Conflict(
            "Subscription is already cancelled".to_string(),
        ));
    }

    users::cancel_subscription(&state.db, &user.email).await?;

    tracing::info!(email = %user.email, "Subscription cancelled, account downgraded to free");

    state.event_bus.emit_lossy(AppEvent::SubscriptionCancelled {
        email: user.email.clone(),
        timestamp: Utc::now(),
    });
    state.event_bus.emit_lossy(AppEvent::PlanChanged {
        email: user.email.clone(),
        plan_id: PlanId::Free.as_str().to_string(),
        timestamp: Utc::now(),
    });

    users::get_user(&state.db, &user.email)
        .await?
        .ok_or_else(|| ApiError::Internal("User vanished during cancellation".to_string()))
}
