//! Identity directory backed by the `identities` table
//!
//! Credentials are stored as salted SHA-256 digests and never read back.
//! An empty credential is stored as an empty digest and matches nothing.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use super::IdentityDirectory;
use crate::error::DirectoryError;
use crate::models::{IdentityRecord, IdentityUpdate};

pub struct SqliteIdentityDirectory {
    pool: SqlitePool,
}

impl SqliteIdentityDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_by_uid(
        executor: impl sqlx::SqliteExecutor<'_>,
        uid: &str,
    ) -> Result<Option<IdentityRecord>, DirectoryError> {
        let row = sqlx::query_as::<_, (String, String, String)>(
            "SELECT uid, email, display_name FROM identities WHERE uid = ?",
        )
        .bind(uid)
        .fetch_optional(executor)
        .await?;

        Ok(row.map(into_record))
    }
}

#[async_trait]
impl IdentityDirectory for SqliteIdentityDirectory {
    async fn lookup_by_email(&self, email: &str) -> Result<IdentityRecord, DirectoryError> {
        let row = sqlx::query_as::<_, (String, String, String)>(
            "SELECT uid, email, display_name FROM identities WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_record)
            .ok_or_else(|| DirectoryError::NotFound(email.to_string()))
    }

    async fn create(&self, record: &IdentityRecord) -> Result<IdentityRecord, DirectoryError> {
        let (password_hash, password_salt) = match record.credential.as_deref() {
            Some(password) if !password.is_empty() => hash_credential(password),
            _ => (String::new(), String::new()),
        };
        let now = roster_common::time::to_storage_string(&roster_common::time::now());

        sqlx::query(
            r#"
            INSERT INTO identities (uid, email, display_name, password_hash, password_salt, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.uid)
        .bind(&record.email)
        .bind(record.display_name.as_deref().unwrap_or(""))
        .bind(&password_hash)
        .bind(&password_salt)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, &record.uid, &record.email))?;

        tracing::debug!(uid = %record.uid, email = %record.email, "Identity created");

        Ok(IdentityRecord {
            credential: None,
            ..record.clone()
        })
    }

    async fn update(
        &self,
        uid: &str,
        fields: &IdentityUpdate,
    ) -> Result<IdentityRecord, DirectoryError> {
        let (password_hash, password_salt) = match fields.credential.as_deref() {
            Some("") => (Some(String::new()), Some(String::new())),
            Some(password) => {
                let (hash, salt) = hash_credential(password);
                (Some(hash), Some(salt))
            }
            None => (None, None),
        };
        let now = roster_common::time::to_storage_string(&roster_common::time::now());

        let mut tx = self.pool.begin().await?;

        if Self::load_by_uid(&mut *tx, uid).await?.is_none() {
            return Err(DirectoryError::NotFound(uid.to_string()));
        }

        sqlx::query(
            r#"
            UPDATE identities SET
                uid = COALESCE(?, uid),
                email = COALESCE(?, email),
                display_name = COALESCE(?, display_name),
                password_hash = COALESCE(?, password_hash),
                password_salt = COALESCE(?, password_salt),
                updated_at = ?
            WHERE uid = ?
            "#,
        )
        .bind(fields.uid.as_deref())
        .bind(fields.email.as_deref())
        .bind(fields.display_name.as_deref())
        .bind(password_hash.as_deref())
        .bind(password_salt.as_deref())
        .bind(&now)
        .bind(uid)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            conflict_or_database(
                e,
                fields.uid.as_deref().unwrap_or(uid),
                fields.email.as_deref().unwrap_or(""),
            )
        })?;

        let new_uid = fields.uid.as_deref().unwrap_or(uid);
        let updated = Self::load_by_uid(&mut *tx, new_uid)
            .await?
            .ok_or_else(|| DirectoryError::Backend(format!("identity {} vanished during update", new_uid)))?;

        tx.commit().await?;

        tracing::debug!(old_uid = %uid, uid = %updated.uid, "Identity updated");
        Ok(updated)
    }
}

fn into_record((uid, email, display_name): (String, String, String)) -> IdentityRecord {
    IdentityRecord {
        uid,
        email,
        display_name: (!display_name.is_empty()).then_some(display_name),
        credential: None,
    }
}

fn conflict_or_database(err: sqlx::Error, uid: &str, email: &str) -> DirectoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DirectoryError::Conflict(
            format!("uid '{}' or email '{}' already belongs to another identity", uid, email),
        ),
        _ => DirectoryError::Database(err),
    }
}

/// Salted digest: hex(sha256(salt || password))
pub fn credential_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// New random salt plus digest; returns (hash, salt)
fn hash_credential(password: &str) -> (String, String) {
    let salt_bytes: [u8; 16] = rand::random();
    let salt: String = salt_bytes.iter().map(|b| format!("{:02x}", b)).collect();
    (credential_digest(&salt, password), salt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_digest_is_salted() {
        let a = credential_digest("aa", "secret");
        let b = credential_digest("bb", "secret");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(a, credential_digest("aa", "secret"));
    }

    #[test]
    fn test_hash_credential_uses_fresh_salt() {
        let (hash1, salt1) = hash_credential("pw");
        let (hash2, salt2) = hash_credential("pw");
        assert_eq!(salt1.len(), 32);
        assert_ne!(salt1, salt2);
        assert_ne!(hash1, hash2);
        assert_eq!(credential_digest(&salt1, "pw"), hash1);
    }
}
