//! Profile store backed by the `profiles` table
//!
//! Documents are JSON objects. A partial write reads the stored object, lays
//! the payload over it and writes it back inside one transaction.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::SqlitePool;

use super::ProfileStore;
use crate::error::ProfileStoreError;
use crate::models::{MergeMode, ProfilePayload};

pub struct SqliteProfileStore {
    pool: SqlitePool,
}

impl SqliteProfileStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Load a stored document
    pub async fn load(&self, uid: &str) -> Result<Option<Map<String, Value>>, ProfileStoreError> {
        let text: Option<String> = sqlx::query_scalar("SELECT document FROM profiles WHERE uid = ?")
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;

        text.map(|t| parse_document(uid, &t)).transpose()
    }

    pub async fn count(&self) -> Result<i64, ProfileStoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn upsert(
        &self,
        uid: &str,
        payload: &ProfilePayload,
        mode: MergeMode,
    ) -> Result<(), ProfileStoreError> {
        let written_at = roster_common::time::now();
        let written_at_str = roster_common::time::to_storage_string(&written_at);

        let mut tx = self.pool.begin().await?;

        let document = match mode {
            MergeMode::Full => payload.to_document(written_at),
            MergeMode::Partial => {
                let existing: Option<String> =
                    sqlx::query_scalar("SELECT document FROM profiles WHERE uid = ?")
                        .bind(uid)
                        .fetch_optional(&mut *tx)
                        .await?;

                let mut document = match existing {
                    Some(text) => parse_document(uid, &text)?,
                    None => Map::new(),
                };
                document.extend(payload.to_document(written_at));
                document
            }
        };

        let text = serde_json::to_string(&Value::Object(document))?;

        sqlx::query(
            r#"
            INSERT INTO profiles (uid, document, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(uid) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(uid)
        .bind(&text)
        .bind(&written_at_str)
        .bind(&written_at_str)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(uid = %uid, mode = ?mode, "Profile written");
        Ok(())
    }
}

fn parse_document(uid: &str, text: &str) -> Result<Map<String, Value>, ProfileStoreError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(ProfileStoreError::Corrupt(uid.to_string())),
    }
}
