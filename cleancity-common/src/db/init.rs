//! Database initialization
//!
//! Creates the database file on first run and brings the schema up to date.
//! Every statement is idempotent, so opening an existing database is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Open (creating if needed) the database and initialize the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets readers (aggregation, export) proceed while a decision commits
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes if they do not exist
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_observations_table(pool).await?;
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

/// Observation records
///
/// Timestamps are microseconds since the Unix epoch. `seq` gives rows a
/// stable insertion order used as the final tie-break in listings. The CHECK
/// constraints restate the record invariants so no writer can bypass them.
async fn create_observations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS observations (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            contributor_id TEXT NOT NULL CHECK (length(contributor_id) > 0),
            label TEXT NOT NULL CHECK (length(label) > 0),
            confidence REAL NOT NULL CHECK (confidence >= 0.0 AND confidence <= 1.0),
            lat REAL NOT NULL CHECK (lat >= -90.0 AND lat <= 90.0),
            lng REAL NOT NULL CHECK (lng >= -180.0 AND lng <= 180.0),
            image_ref TEXT NOT NULL CHECK (length(image_ref) > 0),
            created_at INTEGER NOT NULL,
            state TEXT NOT NULL DEFAULT 'pending'
                CHECK (state IN ('pending', 'approved', 'rejected')),
            decided_by TEXT,
            decided_at INTEGER,
            note TEXT,
            CHECK (
                (state = 'pending' AND decided_by IS NULL AND decided_at IS NULL AND note IS NULL)
                OR (state <> 'pending' AND decided_by IS NOT NULL
                    AND decided_at IS NOT NULL AND decided_at >= created_at)
            )
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_observations_state_created
         ON observations (state, created_at, seq)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
