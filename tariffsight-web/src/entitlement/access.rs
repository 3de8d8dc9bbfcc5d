//! Analysis access decisions

use serde::Serialize;

use crate::models::{SubscriptionStatus, UserRecord};

/// Outcome of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    Deny(DenyReason),
}

/// Why an analysis request was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NotAuthenticated,
    SubscriptionCancelled,
    CreditsExhausted,
}

/// Can this user perform an analysis right now?
///
/// Check order: authentication, then cancellation, then credit balance.
/// A cancelled subscription blocks analysis regardless of remaining
/// credits. Both `credits == -1` (unlimited) and `credits > 0` allow.
///
/// No side effects: the credit decrement happens only after the
/// downstream classification succeeds, so failed attempts are never
/// charged.
pub fn can_analyze(user: Option<&UserRecord>) -> AccessDecision {
    let Some(user) = user else {
        return AccessDecision::Deny(DenyReason::NotAuthenticated);
    };

    if user.subscription_status == SubscriptionStatus::Cancelled {
        return AccessDecision::Deny(DenyReason::SubscriptionCancelled);
    }

    if user.credits == 0 {
        return AccessDecision::Deny(DenyReason::CreditsExhausted);
    }

    AccessDecision::Allow
}
