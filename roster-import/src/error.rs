//! Error types for roster-import
//!
//! Per-record errors (`ValidationError`, `DirectoryError`, `ProfileStoreError`)
//! are caught at the record boundary by the engine. `AssetTransferError` never
//! fails a record. `SourceError` is fatal to the run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Required field missing or empty on an input record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
}

/// Identity directory failure
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Lookup miss; drives the create path, never reported as a failure
    #[error("no identity for {0}")]
    NotFound(String),

    /// Uniqueness violation (uid or email already taken by another identity)
    #[error("identity conflict: {0}")]
    Conflict(String),

    #[error("directory database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Any other backend failure
    #[error("directory error: {0}")]
    Backend(String),
}

impl DirectoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DirectoryError::NotFound(_))
    }
}

/// Profile store write failure
#[derive(Debug, Error)]
pub enum ProfileStoreError {
    #[error("profile database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("profile serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored document is not a JSON object
    #[error("corrupt profile document for {0}")]
    Corrupt(String),
}

/// Upload failure; recovered by the asset associator
#[derive(Debug, Error)]
pub enum AssetTransferError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage answered with a non-success status (permission, quota, ...)
    #[error("upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Source unreadable; aborts the run
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed source: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure categories reported in the batch summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    Directory,
    ProfileStore,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::Directory => "directory",
            FailureKind::ProfileStore => "profile_store",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any error that fails a single record
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    ProfileStore(#[from] ProfileStoreError),
}

impl RecordError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RecordError::Validation(_) => FailureKind::Validation,
            RecordError::Directory(_) => FailureKind::Directory,
            RecordError::ProfileStore(_) => FailureKind::ProfileStore,
        }
    }
}
