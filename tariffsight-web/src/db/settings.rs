//! Settings database operations
//!
//! Get/set accessors for the settings table following the key-value
//! pattern. Holds classifier configuration and the admin-editable site
//! content blob.

use sqlx::{Pool, Sqlite};
use tariffsight_common::{Error, Result};

/// Settings key for the site content JSON blob
pub const SITE_CONTENT_KEY: &str = "site_content";

/// Default classifier request timeout
pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 90;

/// Get classifier endpoint URL
///
/// **Returns:** Some(url) if configured, None if not set
pub async fn get_classifier_endpoint(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, "classifier_endpoint").await
}

/// Set classifier endpoint URL
pub async fn set_classifier_endpoint(db: &Pool<Sqlite>, url: String) -> Result<()> {
    set_setting(db, "classifier_endpoint", url).await
}

/// Get classifier API key
pub async fn get_classifier_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, "classifier_api_key").await
}

/// Set classifier API key
pub async fn set_classifier_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, "classifier_api_key", key).await
}

/// Get classifier request timeout in seconds
///
/// **Default:** 90 seconds; classification of a photo routinely takes
/// tens of seconds.
pub async fn get_classifier_timeout_secs(db: &Pool<Sqlite>) -> Result<u64> {
    get_setting(db, "classifier_timeout_secs")
        .await
        .map(|opt| opt.unwrap_or(DEFAULT_CLASSIFIER_TIMEOUT_SECS))
}

/// Get the raw site content JSON blob
pub async fn get_site_content(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, SITE_CONTENT_KEY).await
}

/// Replace the site content JSON blob
pub async fn set_site_content(db: &Pool<Sqlite>, content: String) -> Result<()> {
    set_setting(db, SITE_CONTENT_KEY, content).await
}

/// Generic setting getter (internal)
async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting failed: {}", e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        tariffsight_common::db::init::create_settings_table(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn endpoint_roundtrip() {
        let pool = setup_test_db().await;

        assert_eq!(get_classifier_endpoint(&pool).await.unwrap(), None);

        set_classifier_endpoint(&pool, "https://api.example.com/classify".to_string())
            .await
            .unwrap();
        assert_eq!(
            get_classifier_endpoint(&pool).await.unwrap(),
            Some("https://api.example.com/classify".to_string())
        );
    }

    #[tokio::test]
    async fn timeout_defaults_when_unset() {
        let pool = setup_test_db().await;
        assert_eq!(
            get_classifier_timeout_secs(&pool).await.unwrap(),
            DEFAULT_CLASSIFIER_TIMEOUT_SECS
        );
    }

    #[tokio::test]
    async fn set_updates_in_place() {
        let pool = setup_test_db().await;

        set_classifier_api_key(&pool, "old-key".to_string()).await.unwrap();
        set_classifier_api_key(&pool, "new-key".to_string()).await.unwrap();

        assert_eq!(
            get_classifier_api_key(&pool).await.unwrap(),
            Some("new-key".to_string())
        );

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE key = 'classifier_api_key'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1, "Should have exactly one entry after update");
    }

    #[tokio::test]
    async fn site_content_blob_roundtrip() {
        let pool = setup_test_db().await;

        let blob = r#"{"hero":{"title":"Classify any product"}}"#;
        set_site_content(&pool, blob.to_string()).await.unwrap();
        assert_eq!(get_site_content(&pool).await.unwrap().as_deref(), Some(blob));
    }
}
