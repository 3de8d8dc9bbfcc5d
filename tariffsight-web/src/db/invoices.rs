//! Billing ledger operations
//!
//! One immutable row per successful payment.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tariffsight_common::{Error, Result};
use uuid::Uuid;

use crate::models::Invoice;

/// Append one invoice record
pub async fn append(pool: &SqlitePool, invoice: &Invoice) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (id, email, plan_name, amount, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(invoice.id.to_string())
    .bind(&invoice.email)
    .bind(&invoice.plan_name)
    .bind(&invoice.amount)
    .bind(&invoice.status)
    .bind(invoice.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// List a user's invoices, most recent first
pub async fn list(pool: &SqlitePool, email: &str) -> Result<Vec<Invoice>> {
    let rows = sqlx::query(
        r#"
        SELECT id, email, plan_name, amount, status, created_at
        FROM invoices
        WHERE email = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(email)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let id_str: String = row.get("id");
            let id = Uuid::parse_str(&id_str)
                .map_err(|e| Error::Internal(format!("Failed to parse invoice id: {}", e)))?;

            let created_at: String = row.get("created_at");
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))?
                .with_timezone(&Utc);

            Ok(Invoice {
                id,
                email: row.get("email"),
                plan_name: row.get("plan_name"),
                amount: row.get("amount"),
                status: row.get("status"),
                created_at,
            })
        })
        .collect()
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
    async fn append_and_list() {
        let pool = setup_pool().await;

        let invoice = Invoice {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            plan_name: "Pro".to_string(),
            amount: "2.499 TL".to_string(),
            status: "paid".to_string(),
            created_at: Utc::now(),
        };
        append(&pool, &invoice).await.unwrap();

        let listed = list(&pool, "a@example.com").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].amount, "2.499 TL");
        assert_eq!(listed[0].status, "paid");

        // Other users see nothing
        assert!(list(&pool, "b@example.com").await.unwrap().is_empty());
    }
}
