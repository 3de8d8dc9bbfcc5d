//! User/entitlement record operations
//!
//! The profile store is the single source of truth for plan, credits,
//! verification state, subscription status and discount. Every credit
//! mutation here is a conditional SQL update, never read-modify-write,
//! so concurrent sessions cannot lose updates or drive a balance
//! negative.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tariffsight_common::{Error, Result};

use crate::models::{
    Discount, PlanId, Role, SubscriptionStatus, UserRecord, VerificationChannel,
    FREE_TIER_CREDITS,
};

/// Outcome of an atomic credit consumption attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// Account has the unlimited sentinel; nothing was decremented
    Unlimited,
    /// One credit consumed; carries the post-decrement balance
    Consumed(i64),
    /// Balance was already zero (possibly drained by a concurrent session)
    Exhausted,
}

/// Create a user with the default free-tier entitlement record
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    password_hash: &str,
) -> Result<UserRecord> {
    let created_at = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO users (email, name, password_hash, role, plan_id, credits,
                           subscription_status, email_verified, phone_verified,
                           discount_active, created_at)
        VALUES (?, ?, ?, 'user', 'free', ?, 'active', 0, 0, 0, ?)
        "#,
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(FREE_TIER_CREDITS)
    .bind(created_at.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            Error::InvalidInput(format!("Email already registered: {}", email))
        }
        other => Error::Database(other),
    })?;

    get_user(pool, email)
        .await?
        .ok_or_else(|| Error::Internal("User missing immediately after insert".to_string()))
}

/// Load a user record by email
pub async fn get_user(pool: &SqlitePool, email: &str) -> Result<Option<UserRecord>> {
    let row = sqlx::query(
        r#"
        SELECT email, name, role, plan_id, credits, subscription_status,
               email_verified, phone_verified, discount_active, discount_rate,
               discount_ends_at, created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(row_to_user).transpose()
}

/// Load the stored password hash for credential verification
pub async fn get_password_hash(pool: &SqlitePool, email: &str) -> Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT password_hash FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(hash,)| hash))
}

/// List all user records (admin only)
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<UserRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT email, name, role, plan_id, credits, subscription_status,
               email_verified, phone_verified, discount_active, discount_rate,
               discount_ends_at, created_at
        FROM users
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_user).collect()
}

/// Hard-delete a user and their dependent rows (admin only)
pub async fn delete_user(pool: &SqlitePool, email: &str) -> Result<bool> {
    sqlx::query("DELETE FROM sessions WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM analysis_history WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM invoices WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await?;

    let result = sqlx::query("DELETE FROM users WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Atomically consume one analysis credit
///
/// Decrement-if-positive: `UPDATE .. WHERE credits > 0` is the only
/// mutation, so two racing sessions on a balance of 1 produce exactly
/// one success and one `Exhausted`.
pub async fn consume_credit(pool: &SqlitePool, email: &str) -> Result<ConsumeOutcome> {
    let credits: Option<i64> = sqlx::query_scalar("SELECT credits FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    let Some(credits) = credits else {
        return Err(Error::NotFound(format!("No such user: {}", email)));
    };

    if credits < 0 {
        return Ok(ConsumeOutcome::Unlimited);
    }

    let result = sqlx::query(
        "UPDATE users SET credits = credits - 1 WHERE email = ? AND credits > 0",
    )
    .bind(email)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(ConsumeOutcome::Exhausted);
    }

    let remaining: i64 = sqlx::query_scalar("SELECT credits FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await?;

    Ok(ConsumeOutcome::Consumed(remaining))
}

/// Grant the one-time verification bonus credit for a channel
///
/// The idempotence guard lives in the SQL predicate: the update only
/// matches while the flag is still unset, so re-verification can never
/// re-grant. Unlimited balances keep the sentinel (the CASE leaves
/// negative values untouched). Returns true when the grant happened.
pub async fn grant_verification_credit(
    pool: &SqlitePool,
    email: &str,
    channel: VerificationChannel,
) -> Result<bool> {
    let sql = match channel {
        VerificationChannel::Email => {
            r#"
            UPDATE users
            SET email_verified = 1,
                credits = CASE WHEN credits >= 0 THEN credits + 1 ELSE credits END
            WHERE email = ? AND email_verified = 0
            "#
        }
        VerificationChannel::Phone => {
            r#"
            UPDATE users
            SET phone_verified = 1,
                credits = CASE WHEN credits >= 0 THEN credits + 1 ELSE credits END
            WHERE email = ? AND phone_verified = 0
            "#
        }
    };

    let result = sqlx::query(sql).bind(email).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

/// Apply a purchased plan: tier, fresh credit allotment, active status
///
/// The retention discount, if any, is consumed by the purchase and
/// cleared here so it cannot apply twice.
pub async fn apply_plan_purchase(
    pool: &SqlitePool,
    email: &str,
    plan_id: PlanId,
    credits: i64,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET plan_id = ?, credits = ?, subscription_status = 'active',
            discount_active = 0, discount_rate = NULL, discount_ends_at = NULL
        WHERE email = ?
        "#,
    )
    .bind(plan_id.as_str())
    .bind(credits)
    .bind(email)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("No such user: {}", email)));
    }
    Ok(())
}

/// Attach a retention discount to an active subscription
///
/// Plan and credits are deliberately untouched; the discount affects
/// only the next purchase.
pub async fn attach_discount(
    pool: &SqlitePool,
    email: &str,
    rate: f64,
    ends_at: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET discount_active = 1, discount_rate = ?, discount_ends_at = ?
        WHERE email = ? AND subscription_status = 'active'
        "#,
    )
    .bind(rate)
    .bind(ends_at.to_rfc3339())
    .bind(email)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Finalize a cancellation: downgrade to free, reset credits, clear discount
///
/// Destructive and irreversible except via a new purchase.
pub async fn cancel_subscription(pool: &SqlitePool, email: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET subscription_status = 'cancelled', plan_id = 'free', credits = ?,
            discount_active = 0, discount_rate = NULL, discount_ends_at = NULL
        WHERE email = ?
        "#,
    )
    .bind(FREE_TIER_CREDITS)
    .bind(email)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("No such user: {}", email)));
    }
    Ok(())
}

/// Admin adjustment of a user's plan and/or credit balance
pub async fn admin_update_user(
    pool: &SqlitePool,
    email: &str,
    plan_id: Option<PlanId>,
    credits: Option<i64>,
) -> Result<bool> {
    if let Some(credits) = credits {
        if credits < -1 {
            return Err(Error::InvalidInput(format!(
                "Invalid credit balance {}: only -1 (unlimited) or >= 0 allowed",
                credits
            )));
        }
    }

    let mut touched = false;
    if let Some(plan_id) = plan_id {
        let result = sqlx::query("UPDATE users SET plan_id = ? WHERE email = ?")
            .bind(plan_id.as_str())
            .bind(email)
            .execute(pool)
            .await?;
        touched |= result.rows_affected() > 0;
    }
    if let Some(credits) = credits {
        let result = sqlx::query("UPDATE users SET credits = ? WHERE email = ?")
            .bind(credits)
            .bind(email)
            .execute(pool)
            .await?;
        touched |= result.rows_affected() > 0;
    }

    Ok(touched)
}

/// Map a users row to the domain record
fn row_to_user(row: sqlx::sqlite::SqliteRow) -> Result<UserRecord> {
    let discount_active: bool = row.get::<i64, _>("discount_active") != 0;
    let discount_rate: Option<f64> = row.get("discount_rate");
    let discount_ends_at: Option<String> = row.get("discount_ends_at");

    // A discount exists only when all three columns are coherent
    let discount = match (discount_rate, discount_ends_at) {
        (Some(rate), Some(ends_at)) => {
            let ends_at = DateTime::parse_from_rfc3339(&ends_at)
                .map_err(|e| Error::Internal(format!("Failed to parse discount_ends_at: {}", e)))?
                .with_timezone(&Utc);
            Some(Discount {
                active: discount_active,
                rate,
                ends_at,
            })
        }
        _ => None,
    };

    let created_at: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&Utc);

    Ok(UserRecord {
        email: row.get("email"),
        name: row.get("name"),
        role: Role::from_str(row.get::<String, _>("role").as_str()),
        plan_id: PlanId::from_str(row.get::<String, _>("plan_id").as_str()),
        credits: row.get("credits"),
        subscription_status: SubscriptionStatus::from_str(
            row.get::<String, _>("subscription_status").as_str(),
        ),
        email_verified: row.get::<i64, _>("email_verified") != 0,
        phone_verified: row.get::<i64, _>("phone_verified") != 0,
        discount,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        tariffsight_common::db::init::create_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn create_and_fetch_default_record() {
        let pool = setup_pool().await;
        create_user(&pool, "a@example.com", "A", "hash").await.unwrap();

        let user = get_user(&pool, "a@example.com").await.unwrap().unwrap();
        assert_eq!(user.plan_id, PlanId::Free);
        assert_eq!(user.credits, FREE_TIER_CREDITS);
        assert_eq!(user.subscription_status, SubscriptionStatus::Active);
        assert!(!user.email_verified);
        assert!(!user.phone_verified);
        assert!(user.discount.is_none());
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let pool = setup_pool().await;
        create_user(&pool, "a@example.com", "A", "hash").await.unwrap();
        let err = create_user(&pool, "a@example.com", "A2", "hash2").await;
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn consume_credit_decrements_and_exhausts() {
        let pool = setup_pool().await;
        create_user(&pool, "a@example.com", "A", "hash").await.unwrap();

        assert_eq!(
            consume_credit(&pool, "a@example.com").await.unwrap(),
            ConsumeOutcome::Consumed(2)
        );
        assert_eq!(
            consume_credit(&pool, "a@example.com").await.unwrap(),
            ConsumeOutcome::Consumed(1)
        );
        assert_eq!(
            consume_credit(&pool, "a@example.com").await.unwrap(),
            ConsumeOutcome::Consumed(0)
        );
        // Floor at zero: further attempts report exhaustion, never negative
        assert_eq!(
            consume_credit(&pool, "a@example.com").await.unwrap(),
            ConsumeOutcome::Exhausted
        );
        let user = get_user(&pool, "a@example.com").await.unwrap().unwrap();
        assert_eq!(user.credits, 0);
    }

    #[tokio::test]
    async fn consume_credit_unlimited_is_noop() {
        let pool = setup_pool().await;
        create_user(&pool, "a@example.com", "A", "hash").await.unwrap();
        apply_plan_purchase(&pool, "a@example.com", PlanId::Pro, -1).await.unwrap();

        assert_eq!(
            consume_credit(&pool, "a@example.com").await.unwrap(),
            ConsumeOutcome::Unlimited
        );
        let user = get_user(&pool, "a@example.com").await.unwrap().unwrap();
        assert_eq!(user.credits, -1);
    }

    #[tokio::test]
    async fn verification_grant_idempotent_at_sql_level() {
        let pool = setup_pool().await;
        create_user(&pool, "a@example.com", "A", "hash").await.unwrap();

        let granted = grant_verification_credit(&pool, "a@example.com", VerificationChannel::Email)
            .await
            .unwrap();
        assert!(granted);

        let again = grant_verification_credit(&pool, "a@example.com", VerificationChannel::Email)
            .await
            .unwrap();
        assert!(!again, "Second grant for the same channel must be a no-op");

        let user = get_user(&pool, "a@example.com").await.unwrap().unwrap();
        assert_eq!(user.credits, FREE_TIER_CREDITS + 1);
        assert!(user.email_verified);
    }

    #[tokio::test]
    async fn cancellation_downgrades_and_clears_discount() {
        let pool = setup_pool().await;
        create_user(&pool, "a@example.com", "A", "hash").await.unwrap();
        apply_plan_purchase(&pool, "a@example.com", PlanId::Pro, -1).await.unwrap();
        attach_discount(&pool, "a@example.com", 0.5, Utc::now() + chrono::Duration::days(90))
            .await
            .unwrap();

        cancel_subscription(&pool, "a@example.com").await.unwrap();

        let user = get_user(&pool, "a@example.com").await.unwrap().unwrap();
        assert_eq!(user.subscription_status, SubscriptionStatus::Cancelled);
        assert_eq!(user.plan_id, PlanId::Free);
        assert_eq!(user.credits, FREE_TIER_CREDITS);
        assert!(user.discount.is_none());
    }

    #[tokio::test]
    async fn purchase_consumes_discount() {
        let pool = setup_pool().await;
        create_user(&pool, "a@example.com", "A", "hash").await.unwrap();
        attach_discount(&pool, "a@example.com", 0.5, Utc::now() + chrono::Duration::days(90))
            .await
            .unwrap();

        apply_plan_purchase(&pool, "a@example.com", PlanId::Starter, 30).await.unwrap();

        let user = get_user(&pool, "a@example.com").await.unwrap().unwrap();
        assert_eq!(user.plan_id, PlanId::Starter);
        assert_eq!(user.credits, 30);
        assert!(user.discount.is_none(), "Purchase must consume the discount");
    }

    #[tokio::test]
    async fn admin_update_rejects_invalid_balance() {
        let pool = setup_pool().await;
        create_user(&pool, "a@example.com", "A", "hash").await.unwrap();

        let err = admin_update_user(&pool, "a@example.com", None, Some(-2)).await;
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }
}
