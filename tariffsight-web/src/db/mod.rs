//! Database access for tariffsight-web
//!
//! All persistence operations over the shared SQLite database. Schema
//! creation lives in `tariffsight_common::db::init`; this module holds
//! the per-table query operations.

pub mod history;
pub mod invoices;
pub mod plans;
pub mod sessions;
pub mod settings;
pub mod users;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Delegates to the shared initializer (schema + plan seeding), then
/// clears any sessions that expired while the service was down.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    let pool = tariffsight_common::db::init_database(db_path).await?;

    let removed = sessions::cleanup_expired(&pool).await?;
    if removed > 0 {
        tracing::info!(removed, "Removed expired sessions at startup");
    }

    Ok(pool)
}
