//! Analysis history ledger operations
//!
//! Append-only per-user records; rows are never mutated after insert
//! and are deletable only by their owner (or admin user deletion).

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tariffsight_common::{Error, Result};
use uuid::Uuid;

use crate::models::{AnalysisRecord, ClassificationResult};

/// Append one history record
pub async fn append(pool: &SqlitePool, record: &AnalysisRecord) -> Result<()> {
    let taxes = serde_json::to_string(&record.result.taxes)?;
    let documents = serde_json::to_string(&record.result.documents)?;

    sqlx::query(
        r#"
        INSERT INTO analysis_history (
            id, email, product_name, description, tariff_code,
            tariff_description, taxes, documents, source_price_range,
            destination_price_range, supplier_email, confidence, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id.to_string())
    .bind(&record.email)
    .bind(&record.result.product_name)
    .bind(&record.result.description)
    .bind(&record.result.tariff_code)
    .bind(&record.result.tariff_description)
    .bind(&taxes)
    .bind(&documents)
    .bind(&record.result.source_price_range)
    .bind(&record.result.destination_price_range)
    .bind(&record.result.supplier_email)
    .bind(record.result.confidence)
    .bind(record.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// List a user's history, most recent first
pub async fn list(pool: &SqlitePool, email: &str) -> Result<Vec<AnalysisRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, email, product_name, description, tariff_code,
               tariff_description, taxes, documents, source_price_range,
               destination_price_range, supplier_email, confidence, created_at
        FROM analysis_history
        WHERE email = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(email)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_record).collect()
}

/// Delete one history record, owner-scoped
///
/// Returns false when the record does not exist or belongs to someone
/// else; the two cases are indistinguishable on purpose.
pub async fn delete(pool: &SqlitePool, email: &str, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM analysis_history WHERE id = ? AND email = ?")
        .bind(id.to_string())
        .bind(email)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn row_to_record(row: sqlx::sqlite::SqliteRow) -> Result<AnalysisRecord> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("Failed to parse history id: {}", e)))?;

    let taxes: String = row.get("taxes");
    let taxes: Vec<String> = serde_json::from_str(&taxes)?;

    let documents: String = row.get("documents");
    let documents: Vec<String> = serde_json::from_str(&documents)?;

    let created_at: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&Utc);

    Ok(AnalysisRecord {
        id,
        email: row.get("email"),
        result: ClassificationResult {
            product_name: row.get("product_name"),
            description: row.get("description"),
            tariff_code: row.get("tariff_code"),
            tariff_description: row.get("tariff_description"),
            taxes,
            documents,
            source_price_range: row.get("source_price_range"),
            destination_price_range: row.get("destination_price_range"),
            supplier_email: row.get("supplier_email"),
            confidence: row.get("confidence"),
        },
        created_at,
    })
}
