//! Site content cache
//!
//! Read-through in-process cache over the `site_content` settings row.
//! The database is authoritative; the cache only saves a query on the
//! landing-page path and is invalidated on every admin write.

use chrono::Utc;
use tariffsight_common::events::AppEvent;

use crate::db::settings;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Fetch the site content blob, hitting the cache first
pub async fn get_content(state: &AppState) -> ApiResult<Option<serde_json::Value>> {
    {
        let cache = state.content_cache.read().await;
        if let Some(value) = cache.as_ref() {
            return Ok(Some(value.clone()));
        }
    }

    let Some(raw) = settings::get_site_content(&state.db).await? else {
        return Ok(None);
    };

    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| ApiError::Internal(format!("Stored site content is not valid JSON: {}", e)))?;

    let mut cache = state.content_cache.write().await;
    *cache = Some(value.clone());

    Ok(Some(value))
}

/// Replace the site content blob and refresh the cache
pub async fn update_content(state: &AppState, value: serde_json::Value) -> ApiResult<()> {
    let raw = serde_json::to_string(&value)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize site content: {}", e)))?;

    settings::set_site_content(&state.db, raw).await?;

    let mut cache = state.content_cache.write().await;
    *cache = Some(value);
    drop(cache);

    state
        .event_bus
        .emit_lossy(AppEvent::ContentUpdated { timestamp: Utc::now() });

    Ok(())
}
