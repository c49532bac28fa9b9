//! Tests for database initialization
//!
//! Covers automatic creation on first run, reopening an existing database,
//! and the shape of the roster tables.

use roster_common::db::init::init_database;
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn table_columns(pool: &SqlitePool, table: &str) -> Vec<String> {
    sqlx::query_scalar::<_, String>(&format!("SELECT name FROM pragma_table_info('{}')", table))
        .fetch_all(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("roster.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("roster.db");

    let pool1 = init_database(&db_path).await.unwrap();
    sqlx::query(
        "INSERT INTO identities (uid, email, created_at, updated_at) VALUES ('u1', 'a@x.com', 'now', 'now')",
    )
    .execute(&pool1)
    .await
    .unwrap();
    pool1.close().await;

    // Second open must keep existing rows (CREATE TABLE IF NOT EXISTS)
    let pool2 = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM identities")
        .fetch_one(&pool2)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_roster_tables_created() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("roster.db")).await.unwrap();

    let identities = table_columns(&pool, "identities").await;
    for column in ["uid", "email", "display_name", "password_hash", "password_salt"] {
        assert!(identities.contains(&column.to_string()), "identities missing {}", column);
    }

    let profiles = table_columns(&pool, "profiles").await;
    assert_eq!(profiles, vec!["uid", "document", "created_at", "updated_at"]);

    let runs = table_columns(&pool, "import_runs").await;
    for column in ["run_id", "submitted", "succeeded", "failed", "cancelled", "failures"] {
        assert!(runs.contains(&column.to_string()), "import_runs missing {}", column);
    }
}

#[tokio::test]
async fn test_identity_email_is_case_insensitive_unique() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("roster.db")).await.unwrap();

    sqlx::query(
        "INSERT INTO identities (uid, email, created_at, updated_at) VALUES ('u1', 'Ann@X.com', 'now', 'now')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let duplicate = sqlx::query(
        "INSERT INTO identities (uid, email, created_at, updated_at) VALUES ('u2', 'ann@x.com', 'now', 'now')",
    )
    .execute(&pool)
    .await;
    assert!(duplicate.is_err(), "emails differing only in case must collide");
}

#[tokio::test]
async fn test_wal_mode_enabled() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("roster.db")).await.unwrap();

    let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}
