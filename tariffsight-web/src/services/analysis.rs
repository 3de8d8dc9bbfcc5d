//! Analysis orchestration
//!
//! Drives one user-initiated analysis request through
//! `Idle -> Submitted -> Classifying -> Succeeded | Failed`:
//!
//! - Submission is guarded by the entitlement engine; a denied request
//!   never reaches the network.
//! - One analysis in flight per session: a second submission while one
//!   is classifying is rejected with a conflict.
//! - The credit decrement is strictly ordered after a structurally valid
//!   classifier response. Failed or abandoned attempts are never charged.
//! - A history-append failure after success degrades (background retry,
//!   logged) but never rolls back the result already produced.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tariffsight_common::events::AppEvent;

use crate::db::users::ConsumeOutcome;
use crate::db::{history, users};
use crate::entitlement::{can_analyze, AccessDecision, DenyReason};
use crate::error::{ApiError, ApiResult};
use crate::models::{AnalysisRecord, UserRecord};
use crate::services::classifier::ClassifierConfig;
use crate::AppState;

/// Result of a successful analysis run
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub record: AnalysisRecord,
    /// Post-decrement balance; -1 for unlimited accounts
    pub credits_remaining: i64,
    /// False when the history append is still being retried in the background
    pub history_persisted: bool,
}

/// Map an entitlement denial onto the API error taxonomy
pub fn deny_to_error(reason: DenyReason) -> ApiError {
    match reason {
        DenyReason::NotAuthenticated => ApiError::AuthRequired,
        DenyReason::SubscriptionCancelled => ApiError::SubscriptionInactive,
        DenyReason::CreditsExhausted => ApiError::CreditsExhausted,
    }
}

/// Single-flight registry entry; releases its slot on drop
///
/// Drop-based release keeps the slot from leaking when the handler
/// future is abandoned mid-classification (client navigated away).
pub struct InFlightGuard {
    set: Arc<Mutex<HashSet<String>>>,
    email: String,
}

impl InFlightGuard {
    /// Claim the slot for a session; None when one is already running
    pub fn acquire(set: &Arc<Mutex<HashSet<String>>>, email: &str) -> Option<Self> {
        let mut in_flight = match set.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !in_flight.insert(email.to_string()) {
            return None;
        }
        Some(Self {
            set: Arc::clone(set),
            email: email.to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut in_flight = match self.set.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        in_flight.remove(&self.email);
    }
}

/// Run one analysis request end to end
pub async fn run_analysis(
    state: &AppState,
    user: Option<&UserRecord>,
    image: Vec<u8>,
    filename: &str,
) -> ApiResult<AnalysisOutcome> {
    // Idle -> Submitted: entitlement gate before anything else
    let Some(user) = user else {
        return Err(deny_to_error(DenyReason::NotAuthenticated));
    };
    if let AccessDecision::Deny(reason) = can_analyze(Some(user)) {
        return Err(deny_to_error(reason));
    }

    // Submitted -> Classifying: claim the single-flight slot
    let _guard = InFlightGuard::acquire(&state.in_flight, &user.email).ok_or_else(|| {
        ApiError::Conflict("An analysis is already in progress for this session".to_string())
    })?;

    let config = ClassifierConfig::load(&state.db).await?;

    state.event_bus.emit_lossy(AppEvent::AnalysisStarted {
        email: user.email.clone(),
        timestamp: Utc::now(),
    });

    let started = Instant::now();
    let result = match state.classifier.classify(&config, &image, filename).await {
        Ok(result) => result,
        Err(err) => {
            // Classifying -> Failed: surface with retry affordance, no charge
            tracing::warn!(
                email = %user.email,
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %err,
                "Classification failed"
            );
            state.event_bus.emit_lossy(AppEvent::AnalysisFailed {
                email: user.email.clone(),
                reason: err.to_string(),
                timestamp: Utc::now(),
            });
            return Err(err.into());
        }
    };

    tracing::info!(
        email = %user.email,
        tariff_code = %result.tariff_code,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Classification succeeded"
    );

    // Classifying -> Succeeded: charge only now, atomically
    let credits_remaining = match users::consume_credit(&state.db, &user.email).await? {
        ConsumeOutcome::Unlimited => -1,
        ConsumeOutcome::Consumed(remaining) => remaining,
        ConsumeOutcome::Exhausted => {
            // A concurrent session drained the balance between the gate and
            // the decrement; the conditional update caught it
            state.event_bus.emit_lossy(AppEvent::AnalysisFailed {
                email: user.email.clone(),
                reason: "No analysis credits remaining".to_string(),
                timestamp: Utc::now(),
            });
            return Err(ApiError::CreditsExhausted);
        }
    };

    let record = AnalysisRecord::new(&user.email, result);

    // Losing the history row is degraded, not fatal: the user already has
    // their result
    let history_persisted = match history::append(&state.db, &record).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                email = %user.email,
                history_id = %record.id,
                error = %err,
                "History append failed, retrying in background"
            );
            retry_history_append(state.db.clone(), record.clone());
            false
        }
    };

    state.event_bus.emit_lossy(AppEvent::AnalysisCompleted {
        email: user.email.clone(),
        history_id: record.id,
        tariff_code: record.result.tariff_code.clone(),
        credits_remaining,
        timestamp: Utc::now(),
    });

    Ok(AnalysisOutcome {
        record,
        credits_remaining,
        history_persisted,
    })
}

/// Retry a failed history append with backoff, off the request path
fn retry_history_append(pool: SqlitePool, record: AnalysisRecord) {
    tokio::spawn(async move {
        for attempt in 1u32..=3 {
            tokio::time::sleep(std::time::Duration::from_secs(1 << attempt)).await;
            match history::append(&pool, &record).await {
                Ok(()) => {
                    tracing::info!(history_id = %record.id, attempt, "History append recovered");
                    return;
                }
                Err(err) => {
                    tracing::warn!(history_id = %record.id, attempt, error = %err, "History append retry failed");
                }
            }
        }
        tracing::error!(history_id = %record.id, "History record lost after retries");
    });
}
