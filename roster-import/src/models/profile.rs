//! Profile documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Profile document keys
pub mod keys {
    pub const EMAIL: &str = "email";
    pub const ROLE: &str = "role";
    pub const UID: &str = "uid";
    pub const IMAGE_URL: &str = "imageUrl";
    pub const DEPARTMENT: &str = "department";
    pub const BRANCH: &str = "branch";
    pub const COURSE: &str = "course";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// How a payload is applied to the stored document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Payload replaces the whole document
    Full,
    /// Payload keys overwrite, all other stored keys persist
    Partial,
}

/// Timestamp key stamped by the store at write time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampField {
    CreatedAt,
    UpdatedAt,
}

impl TimestampField {
    pub fn key(&self) -> &'static str {
        match self {
            TimestampField::CreatedAt => keys::CREATED_AT,
            TimestampField::UpdatedAt => keys::UPDATED_AT,
        }
    }
}

/// Composed profile fields, minus the server-side timestamp value
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePayload {
    /// Base fields plus the active role's attributes
    pub fields: Map<String, Value>,
    pub timestamp_field: TimestampField,
}

/// A payload ready for `ProfileStore::upsert`
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileWrite {
    /// Document key
    pub uid: String,
    pub payload: ProfilePayload,
    pub mode: MergeMode,
}

impl ProfilePayload {
    /// Field value by key (timestamp excluded)
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Every key the written document will receive, timestamp included
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        keys.push(self.timestamp_field.key());
        keys
    }

    /// Materialize the payload with the store's write time
    pub fn to_document(&self, written_at: DateTime<Utc>) -> Map<String, Value> {
        let mut document = self.fields.clone();
        document.insert(
            self.timestamp_field.key().to_string(),
            Value::String(roster_common::time::to_storage_string(&written_at)),
        );
        document
    }
}
