//! Plan catalog operations
//!
//! Plans are static configuration seeded at first startup and editable
//! by admins with the manage-plans permission.

use sqlx::{Row, SqlitePool};
use tariffsight_common::Result;

use crate::models::{Plan, PlanId};

/// List the catalog in display order
pub async fn list_plans(pool: &SqlitePool) -> Result<Vec<Plan>> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, price, credits, features, popular, sort_order
        FROM plans
        ORDER BY sort_order ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_to_plan).collect()
}

/// Load one plan by id
pub async fn get_plan(pool: &SqlitePool, id: PlanId) -> Result<Option<Plan>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, price, credits, features, popular, sort_order
        FROM plans
        WHERE id = ?
        "#,
    )
    .bind(id.as_str())
    .fetch_optional(pool)
    .await?;

    row.map(row_to_plan).transpose()
}

/// Insert or update a catalog entry (admin)
pub async fn upsert_plan(pool: &SqlitePool, plan: &Plan) -> Result<()> {
    let features = serde_json::to_string(&plan.features)?;

    sqlx::query(
        r#"
        INSERT INTO plans (id, name, price, credits, features, popular, sort_order)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            price = excluded.price,
            credits = excluded.credits,
            features = excluded.features,
            popular = excluded.popular,
            sort_order = excluded.sort_order
        "#,
    )
    .bind(plan.id.as_str())
    .bind(&plan.name)
    .bind(&plan.price)
    .bind(plan.credits)
    .bind(&features)
    .bind(plan.popular as i64)
    .bind(plan.sort_order)
    .execute(pool)
    .await?;

    Ok(())
}

fn row_to_plan(row: sqlx::sqlite::SqliteRow) -> Result<Plan> {
    let features: String = row.get("features");
    let features: Vec<String> = serde_json::from_str(&features)?;

    Ok(Plan {
        id: PlanId::from_str(row.get::<String, _>("id").as_str()),
        name: row.get("name"),
        price: row.get("price"),
        credits: row.get("credits"),
        features,
        popular: row.get::<i64, _>("popular") != 0,
        sort_order: row.get("sort_order"),
    })
}
