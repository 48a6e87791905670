//! Feedback record persistence
//!
//! Append-only: records are never updated or deleted once written.
//! Append is idempotent by id, so a retried submission cannot duplicate
//! a row.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::FeedbackRecord;
use pulse_common::{Error, Result};

/// Append one record to the store
///
/// `ON CONFLICT(id) DO NOTHING` gives at-most-once semantics per record
/// id: re-appending an already stored record is a successful no-op. The
/// single-statement insert leaves no partial record on failure.
pub async fn append_feedback(pool: &SqlitePool, record: &FeedbackRecord) -> Result<()> {
    // Prepare all data before acquiring a connection
    let id = record.id.to_string();
    let created_at = record.created_at.to_rfc3339();
    let rating = record.rating as i64;

    let result = sqlx::query(
        r#"
        INSERT INTO feedback (
            id, created_at, rating, review,
            ai_response, ai_summary, ai_actions,
            name, email, category
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO NOTHING
        "#,
    )
    .bind(&id)
    .bind(&created_at)
    .bind(rating)
    .bind(&record.review)
    .bind(&record.ai_response)
    .bind(&record.ai_summary)
    .bind(&record.ai_actions)
    .bind(&record.name)
    .bind(&record.email)
    .bind(&record.category)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        tracing::debug!(record_id = %record.id, "Record already stored, append is a no-op");
    }

    Ok(())
}

/// Load every stored record
///
/// No ordering contract: ordering belongs to the aggregation engine.
/// An empty store yields an empty vector, which is distinct from a
/// storage error.
pub async fn load_all_feedback(pool: &SqlitePool) -> Result<Vec<FeedbackRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, created_at, rating, review,
               ai_response, ai_summary, ai_actions,
               name, email, category
        FROM feedback
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(record_from_row).collect()
}

/// Count stored records (diagnostics)
pub async fn count_feedback(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn record_from_row(row: sqlx::sqlite::SqliteRow) -> Result<FeedbackRecord> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Invalid record id: {}", e)))?;

    let created_at: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| Error::Internal(format!("Invalid created_at: {}", e)))?
        .with_timezone(&Utc);

    let rating: i64 = row.get("rating");
    let rating = u8::try_from(rating)
        .map_err(|_| Error::Internal(format!("Invalid rating in stored row: {}", rating)))?;

    Ok(FeedbackRecord {
        id,
        created_at,
        rating,
        review: row.get("review"),
        ai_response: row.get("ai_response"),
        ai_summary: row.get("ai_summary"),
        ai_actions: row.get("ai_actions"),
        name: row.get("name"),
        email: row.get("email"),
        category: row.get("category"),
    })
}
