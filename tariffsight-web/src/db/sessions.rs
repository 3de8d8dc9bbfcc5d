//! Session persistence
//!
//! Opaque bearer tokens handed to clients; only the SHA-256 hash is
//! stored. Expiry is enforced lazily on lookup and swept at startup.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tariffsight_common::Result;

/// Sessions live for 30 days from creation
const SESSION_TTL_DAYS: i64 = 30;

/// Create a session for a user and return the raw bearer token
pub async fn create_session(pool: &SqlitePool, email: &str) -> Result<String> {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex_encode(&bytes);

    let now = Utc::now();
    let expires_at = now + Duration::days(SESSION_TTL_DAYS);

    sqlx::query(
        r#"
        INSERT INTO sessions (token_hash, email, created_at, expires_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(hash_token(&token))
    .bind(email)
    .bind(now.to_rfc3339())
    .bind(expires_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(token)
}

/// Resolve a raw bearer token to its owning email
///
/// Expired sessions are deleted on touch and resolve to None.
pub async fn lookup_session(pool: &SqlitePool, token: &str) -> Result<Option<String>> {
    let token_hash = hash_token(token);

    let row: Option<(String, String)> =
        sqlx::query_as("SELECT email, expires_at FROM sessions WHERE token_hash = ?")
            .bind(&token_hash)
            .fetch_optional(pool)
            .await?;

    let Some((email, expires_at)) = row else {
        return Ok(None);
    };

    let expired = DateTime::parse_from_rfc3339(&expires_at)
        .map(|dt| dt.with_timezone(&Utc) <= Utc::now())
        .unwrap_or(true);

    if expired {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(&token_hash)
            .execute(pool)
            .await?;
        return Ok(None);
    }

    Ok(Some(email))
}

/// Delete one session (sign-out)
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(hash_token(token))
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete every session belonging to a user (admin delete, credential reset)
pub async fn delete_sessions_for(pool: &SqlitePool, email: &str) -> Result<usize> {
    let result = sqlx::query("DELETE FROM sessions WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() as usize)
}

/// Sweep sessions that expired while the service was down
///
/// Any session past its expiry at startup will never be valid again.
pub async fn cleanup_expired(pool: &SqlitePool) -> Result<usize> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() as usize)
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
