//! Database access for pulse-fb
//!
//! SQLite via sqlx; one `feedback` table created at startup.

pub mod feedback;

use pulse_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Creates the parent directory and the database file if missing.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize pulse-fb tables
///
/// Creates the feedback table if it doesn't exist. Public so tests can
/// apply the schema to in-memory pools.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feedback (
            id TEXT PRIMARY KEY,
            created_at TEXT NOT NULL,
            rating INTEGER NOT NULL,
            review TEXT NOT NULL,
            ai_response TEXT NOT NULL,
            ai_summary TEXT NOT NULL,
            ai_actions TEXT NOT NULL,
            name TEXT,
            email TEXT,
            category TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (feedback)");

    Ok(())
}
