//! Credit grant and consumption rules
//!
//! In-memory transition functions mirroring the conditional SQL updates
//! in `db::users`. The SQL path is authoritative for persisted state;
//! these functions define the rules and back the decision logic tests.

use crate::models::{UserRecord, VerificationChannel, UNLIMITED_CREDITS};

/// Grant the one-time verification bonus credit for a channel
///
/// Idempotent: if the flag is already set, the record is returned
/// unchanged. Unlimited accounts keep the sentinel; the flag is still
/// set so re-verification cannot grant later.
pub fn grant_verification_credit(mut user: UserRecord, channel: VerificationChannel) -> UserRecord {
    if user.is_verified(channel) {
        return user;
    }

    match channel {
        VerificationChannel::Email => user.email_verified = true,
        VerificationChannel::Phone => user.phone_verified = true,
    }

    if user.credits != UNLIMITED_CREDITS {
        user.credits += 1;
    }

    user
}

/// Consume one credit after a confirmed successful analysis
///
/// Unlimited accounts are untouched. The balance floors at zero; it can
/// never go negative through this path.
pub fn consume_credit(mut user: UserRecord) -> UserRecord {
    if user.credits == UNLIMITED_CREDITS {
        return user;
    }

    user.credits = (user.credits - 1).max(0);
    user
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanId, Role, SubscriptionStatus};
    use chrono::Utc;

    fn user_with_credits(credits: i64) -> UserRecord {
        UserRecord {
            email: "importer@example.com".to_string(),
            name: "Importer".to_string(),
            role: Role::User,
            plan_id: PlanId::Free,
            credits,
            subscription_status: SubscriptionStatus::Active,
            email_verified: false,
            phone_verified: false,
            discount: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn verification_grants_exactly_one_credit() {
        let user = user_with_credits(3);
        let user = grant_verification_credit(user, VerificationChannel::Email);
        assert!(user.email_verified);
        assert_eq!(user.credits, 4);
    }

    #[test]
    fn verification_grant_is_idempotent() {
        let user = user_with_credits(3);
        let once = grant_verification_credit(user.clone(), VerificationChannel::Email);
        let twice = grant_verification_credit(once.clone(), VerificationChannel::Email);
        assert_eq!(once.credits, twice.credits);
        assert_eq!(twice.credits, 4);
    }

    #[test]
    fn channels_grant_independently() {
        let user = user_with_credits(0);
        let user = grant_verification_credit(user, VerificationChannel::Email);
        let user = grant_verification_credit(user, VerificationChannel::Phone);
        assert_eq!(user.credits, 2);
        assert!(user.email_verified);
        assert!(user.phone_verified);
    }

    #[test]
    fn unlimited_stays_unlimited_on_grant() {
        let user = user_with_credits(UNLIMITED_CREDITS);
        let user = grant_verification_credit(user, VerificationChannel::Phone);
        assert!(user.phone_verified);
        assert_eq!(user.credits, UNLIMITED_CREDITS);
    }

    #[test]
    fn consume_decrements_by_one() {
        let user = consume_credit(user_with_credits(3));
        assert_eq!(user.credits, 2);
    }

    #[test]
    fn consume_floors_at_zero() {
        let user = consume_credit(user_with_credits(0));
        assert_eq!(user.credits, 0);
    }

    #[test]
    fn consume_is_noop_for_unlimited() {
        let user = consume_credit(user_with_credits(UNLIMITED_CREDITS));
        assert_eq!(user.credits, UNLIMITED_CREDITS);
    }
}
