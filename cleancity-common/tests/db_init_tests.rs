//! Tests for database creation and schema constraints

use cleancity_common::db::init::{init_database, SCHEMA_VERSION};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("cleancity.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("cleancity.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_version")
        .fetch_all(&pool2.unwrap())
        .await
        .unwrap();
    assert_eq!(versions, vec![SCHEMA_VERSION]);
}

#[tokio::test]
async fn test_schema_rejects_out_of_range_coordinates() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("cleancity.db")).await.unwrap();

    let result = sqlx::query(
        "INSERT INTO observations (id, contributor_id, label, confidence, lat, lng, image_ref, created_at)
         VALUES ('a', 'u1', 'Plastic', 0.5, 91.0, 0.0, 'uploads/a.jpg', 1)",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "lat=91 must violate the CHECK constraint");
}

#[tokio::test]
async fn test_schema_requires_decision_metadata_for_terminal_state() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("cleancity.db")).await.unwrap();

    let result = sqlx::query(
        "INSERT INTO observations (id, contributor_id, label, confidence, lat, lng, image_ref, created_at, state)
         VALUES ('b', 'u1', 'Paper', 0.5, 10.0, 10.0, 'uploads/b.jpg', 1, 'approved')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "approved row without decider must be rejected");
}
