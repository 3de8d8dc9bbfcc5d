//! Database initialization
//!
//! Creates the SQLite database on first run with the full schema and the
//! default plan catalog. All statements are idempotent so startup is safe
//! to repeat against an existing database.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode allows concurrent readers with one writer; the credit
    // decrement path depends on writes not being serialized behind reads
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_tables(&pool).await?;
    seed_default_plans(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_sessions_table(pool).await?;
    create_plans_table(pool).await?;
    create_analysis_history_table(pool).await?;
    create_invoices_table(pool).await?;
    create_settings_table(pool).await?;

    info!("Database tables initialized");
    Ok(())
}

/// Users table: the authoritative entitlement record, one row per identity
pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            email TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            plan_id TEXT NOT NULL DEFAULT 'free',
            credits INTEGER NOT NULL DEFAULT 3,
            subscription_status TEXT NOT NULL DEFAULT 'active',
            email_verified INTEGER NOT NULL DEFAULT 0,
            phone_verified INTEGER NOT NULL DEFAULT 0,
            discount_active INTEGER NOT NULL DEFAULT 0,
            discount_rate REAL,
            discount_ends_at TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Sessions table: token hashes only, never raw tokens
pub async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token_hash TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Plan catalog table: static configuration, admin-editable
pub async fn create_plans_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plans (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            price TEXT NOT NULL,
            credits INTEGER NOT NULL,
            features TEXT NOT NULL DEFAULT '[]',
            popular INTEGER NOT NULL DEFAULT 0,
            sort_order INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Analysis history table: append-only per-user ledger
pub async fn create_analysis_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_history (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            product_name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            tariff_code TEXT NOT NULL,
            tariff_description TEXT NOT NULL DEFAULT '',
            taxes TEXT NOT NULL,
            documents TEXT NOT NULL DEFAULT '[]',
            source_price_range TEXT,
            destination_price_range TEXT,
            supplier_email TEXT,
            confidence REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Invoices table: append-only billing ledger
pub async fn create_invoices_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS invoices (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            plan_name TEXT NOT NULL,
            amount TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Settings table: key-value store (classifier config, site content blob)
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Seed the four default plans on first startup
///
/// Runs only when the plans table is empty so admin edits survive restarts.
pub async fn seed_default_plans(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM plans")
        .fetch_one(pool)
        .await?;

    if count > 0 {
        return Ok(());
    }

    let defaults: [(&str, &str, &str, i64, &str, i64, i64); 4] = [
        (
            "free",
            "Free",
            "0 TL",
            3,
            r#"["Tariff code classification","Tax and document breakdown"]"#,
            0,
            0,
        ),
        (
            "starter",
            "Starter",
            "499 TL",
            30,
            r#"["Tariff code classification","Tax and document breakdown","Priority support"]"#,
            0,
            1,
        ),
        (
            "pro",
            "Pro",
            "2.499 TL",
            -1,
            r#"["Unlimited analyses","Market price analysis","Supplier email drafts","Priority support"]"#,
            1,
            2,
        ),
        (
            "enterprise",
            "Enterprise",
            "9.999 TL",
            -1,
            r#"["Unlimited analyses","Market price analysis","Supplier email drafts","Dedicated account manager"]"#,
            0,
            3,
        ),
    ];

    for (id, name, price, credits, features, popular, sort_order) in defaults {
        sqlx::query(
            r#"
            INSERT INTO plans (id, name, price, credits, features, popular, sort_order)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(price)
        .bind(credits)
        .bind(features)
        .bind(popular)
        .bind(sort_order)
        .execute(pool)
        .await?;
    }

    info!("Seeded default plan catalog (free, starter, pro, enterprise)");
    Ok(())
}
