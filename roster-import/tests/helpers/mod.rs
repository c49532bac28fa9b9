//! Shared test helpers for roster-import integration tests
//!
//! Store doubles record every call into one shared `CallLog`, so tests can
//! assert on the exact order of side effects across stores.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use roster_import::error::{AssetTransferError, DirectoryError, ProfileStoreError};
use roster_import::models::{IdentityRecord, IdentityUpdate, MergeMode, ProfilePayload, RawRecord};
use roster_import::stores::sqlite_directory::credential_digest;
use roster_import::stores::{AssetTransfer, IdentityDirectory, ProfileStore, UploadOptions};

/// One observed store or transfer call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Lookup(String),
    Create(String),
    Update { uid: String, new_uid: Option<String> },
    Upsert { uid: String, mode: MergeMode },
    UploadStarted(String),
    UploadFinished(String),
}

#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn creates(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(uid) => Some(uid),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Update { .. }))
            .count()
    }

    pub fn upserts(&self) -> Vec<(String, MergeMode)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Upsert { uid, mode } => Some((uid, mode)),
                _ => None,
            })
            .collect()
    }

    /// Calls that change store state (lookups and uploads excluded)
    pub fn writes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Create(_) | Call::Update { .. } | Call::Upsert { .. }))
            .count()
    }
}

/// In-memory identity directory keyed by email
pub struct RecordingDirectory {
    log: CallLog,
    identities: Mutex<HashMap<String, IdentityRecord>>,
    failing_emails: HashSet<String>,
    cancel_on_create: Option<CancellationToken>,
}

impl RecordingDirectory {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            identities: Mutex::new(HashMap::new()),
            failing_emails: HashSet::new(),
            cancel_on_create: None,
        }
    }

    /// Pre-existing identity
    pub fn with_identity(self, uid: &str, email: &str) -> Self {
        self.identities.lock().unwrap().insert(
            email.to_string(),
            IdentityRecord {
                uid: uid.to_string(),
                email: email.to_string(),
                display_name: Some("Existing".to_string()),
                credential: Some("old-secret".to_string()),
            },
        );
        self
    }

    /// Lookups for `email` fail with a backend error
    pub fn failing_for(mut self, email: &str) -> Self {
        self.failing_emails.insert(email.to_string());
        self
    }

    /// Cancel `token` as soon as the first identity is created
    pub fn cancel_on_create(mut self, token: CancellationToken) -> Self {
        self.cancel_on_create = Some(token);
        self
    }

    pub fn get(&self, email: &str) -> Option<IdentityRecord> {
        self.identities.lock().unwrap().get(email).cloned()
    }
}

#[async_trait]
impl IdentityDirectory for RecordingDirectory {
    async fn lookup_by_email(&self, email: &str) -> Result<IdentityRecord, DirectoryError> {
        self.log.push(Call::Lookup(email.to_string()));
        if self.failing_emails.contains(email) {
            return Err(DirectoryError::Backend("directory unavailable".to_string()));
        }
        self.get(email)
            .map(|record| IdentityRecord {
                credential: None,
                ..record
            })
            .ok_or_else(|| DirectoryError::NotFound(email.to_string()))
    }

    async fn create(&self, record: &IdentityRecord) -> Result<IdentityRecord, DirectoryError> {
        self.log.push(Call::Create(record.uid.clone()));
        self.identities
            .lock()
            .unwrap()
            .insert(record.email.clone(), record.clone());
        if let Some(token) = &self.cancel_on_create {
            token.cancel();
        }
        Ok(IdentityRecord {
            credential: None,
            ..record.clone()
        })
    }

    async fn update(&self, uid: &str, fields: &IdentityUpdate) -> Result<IdentityRecord, DirectoryError> {
        self.log.push(Call::Update {
            uid: uid.to_string(),
            new_uid: fields.uid.clone(),
        });

        let mut identities = self.identities.lock().unwrap();
        let old_email = identities
            .values()
            .find(|r| r.uid == uid)
            .map(|r| r.email.clone())
            .ok_or_else(|| DirectoryError::NotFound(uid.to_string()))?;
        let mut record = identities
            .remove(&old_email)
            .ok_or_else(|| DirectoryError::NotFound(uid.to_string()))?;

        if let Some(v) = &fields.uid {
            record.uid = v.clone();
        }
        if let Some(v) = &fields.email {
            record.email = v.clone();
        }
        if let Some(v) = &fields.display_name {
            record.display_name = (!v.is_empty()).then(|| v.clone());
        }
        if let Some(v) = &fields.credential {
            record.credential = (!v.is_empty()).then(|| v.clone());
        }
        identities.insert(record.email.clone(), record.clone());

        Ok(IdentityRecord {
            credential: None,
            ..record
        })
    }
}

/// In-memory profile store with the same merge/replace semantics as SQLite
pub struct RecordingProfileStore {
    log: CallLog,
    documents: Mutex<HashMap<String, Map<String, Value>>>,
    failing_uids: HashSet<String>,
}

impl RecordingProfileStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            documents: Mutex::new(HashMap::new()),
            failing_uids: HashSet::new(),
        }
    }

    pub fn with_document(self, uid: &str, document: Value) -> Self {
        if let Value::Object(map) = document {
            self.documents.lock().unwrap().insert(uid.to_string(), map);
        }
        self
    }

    /// Writes for `uid` fail
    pub fn failing_for(mut self, uid: &str) -> Self {
        self.failing_uids.insert(uid.to_string());
        self
    }

    pub fn document(&self, uid: &str) -> Option<Map<String, Value>> {
        self.documents.lock().unwrap().get(uid).cloned()
    }
}

#[async_trait]
impl ProfileStore for RecordingProfileStore {
    async fn upsert(&self, uid: &str, payload: &ProfilePayload, mode: MergeMode) -> Result<(), ProfileStoreError> {
        self.log.push(Call::Upsert {
            uid: uid.to_string(),
            mode,
        });
        if self.failing_uids.contains(uid) {
            return Err(ProfileStoreError::Corrupt(uid.to_string()));
        }

        let written = payload.to_document(chrono::Utc::now());
        let mut documents = self.documents.lock().unwrap();
        match mode {
            MergeMode::Full => {
                documents.insert(uid.to_string(), written);
            }
            MergeMode::Partial => {
                documents.entry(uid.to_string()).or_default().extend(written);
            }
        }
        Ok(())
    }
}

/// Upload double: optional per-object delay, optional rejection
pub struct TestAssetTransfer {
    log: CallLog,
    delays: HashMap<String, Duration>,
    reject: bool,
}

impl TestAssetTransfer {
    /// Accepts every upload immediately
    pub fn accepting(log: CallLog) -> Self {
        Self {
            log,
            delays: HashMap::new(),
            reject: false,
        }
    }

    /// Rejects every upload with a permission error
    pub fn failing(log: CallLog) -> Self {
        Self {
            reject: true,
            ..Self::accepting(log)
        }
    }

    /// Delay the upload of `destination`
    pub fn slow_for(mut self, destination: &str, delay: Duration) -> Self {
        self.delays.insert(destination.to_string(), delay);
        self
    }
}

#[async_trait]
impl AssetTransfer for TestAssetTransfer {
    async fn upload(
        &self,
        _local_path: &Path,
        destination: &str,
        _options: &UploadOptions,
    ) -> Result<String, AssetTransferError> {
        self.log.push(Call::UploadStarted(destination.to_string()));
        if let Some(delay) = self.delays.get(destination) {
            tokio::time::sleep(*delay).await;
        }
        self.log.push(Call::UploadFinished(destination.to_string()));

        if self.reject {
            return Err(AssetTransferError::Rejected {
                status: 403,
                body: "permission denied".to_string(),
            });
        }
        Ok(format!("https://storage.test/v0/b/test/o/{}?alt=media", destination.replace('/', "%2F")))
    }
}

/// Raw record with the given fields on `line_number`
pub fn raw(line_number: usize, fields: &[(&str, &str)]) -> RawRecord {
    fields
        .iter()
        .fold(RawRecord::new(line_number), |record, (k, v)| record.with_field(*k, *v))
}

/// Temporary roster database with all tables created
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().unwrap();
    let pool = roster_common::db::init_database(&temp_dir.path().join("roster.db"))
        .await
        .unwrap();
    (temp_dir, pool)
}

/// Whether `password` matches the digest stored for `uid`; `None` when the
/// identity does not exist
pub async fn credential_matches(pool: &SqlitePool, uid: &str, password: &str) -> Option<bool> {
    let (hash, salt) = sqlx::query_as::<_, (String, String)>(
        "SELECT password_hash, password_salt FROM identities WHERE uid = ?",
    )
    .bind(uid)
    .fetch_optional(pool)
    .await
    .unwrap()?;

    Some(!hash.is_empty() && credential_digest(&salt, password) == hash)
}

/// Write `content` to `<dir>/<name>` and return the path
pub fn write_fixture(dir: &Path, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
