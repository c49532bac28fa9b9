//! Store and transfer interfaces
//!
//! The engine depends only on these traits. Concrete adapters:
//! - `SqliteIdentityDirectory` / `SqliteProfileStore` (shared roster database)
//! - `HttpAssetTransfer` (object storage media upload API)
//! - `LocalAssetTransfer` (bucket directory on disk)
//!
//! All implementations must be `Send + Sync` so they can be shared as
//! `Arc<dyn Trait>` and replaced by doubles in tests.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{AssetTransferError, DirectoryError, ProfileStoreError};
use crate::models::{IdentityRecord, IdentityUpdate, MergeMode, ProfilePayload};

pub mod http_assets;
pub mod local_assets;
pub mod sqlite_directory;
pub mod sqlite_profiles;

pub use http_assets::HttpAssetTransfer;
pub use local_assets::LocalAssetTransfer;
pub use sqlite_directory::SqliteIdentityDirectory;
pub use sqlite_profiles::SqliteProfileStore;

/// Authentication records keyed by uid, looked up by email
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Returns `DirectoryError::NotFound` when no identity has this email
    async fn lookup_by_email(&self, email: &str) -> Result<IdentityRecord, DirectoryError>;

    /// Create an identity; `record.uid` becomes its primary key
    async fn create(&self, record: &IdentityRecord) -> Result<IdentityRecord, DirectoryError>;

    /// Apply the `Some` fields of `fields` to the identity currently keyed by `uid`
    async fn update(&self, uid: &str, fields: &IdentityUpdate)
        -> Result<IdentityRecord, DirectoryError>;
}

/// Document store for per-role profiles, keyed by uid
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Write `payload` under `uid`, stamping its timestamp field with the store clock
    ///
    /// `MergeMode::Full` replaces the document; `MergeMode::Partial` merges
    /// into it (creating it when absent).
    async fn upsert(
        &self,
        uid: &str,
        payload: &ProfilePayload,
        mode: MergeMode,
    ) -> Result<(), ProfileStoreError>;
}

/// Upload options passed through to the transfer service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Make the object publicly readable
    pub public: bool,
    pub content_type: String,
}

/// Durable storage for local media files
#[async_trait]
pub trait AssetTransfer: Send + Sync {
    /// Upload `local_path` as `destination` (overwriting any object of that
    /// name) and return its public download URL
    async fn upload(
        &self,
        local_path: &Path,
        destination: &str,
        options: &UploadOptions,
    ) -> Result<String, AssetTransferError>;
}

/// Public download URL for an object
///
/// `https://<host>/v0/b/<bucket>/o/<url-encoded object>?alt=media`
pub fn public_media_url(public_host: &str, bucket: &str, object: &str) -> String {
    format!(
        "https://{}/v0/b/{}/o/{}?alt=media",
        public_host.trim_end_matches('/'),
        bucket,
        urlencoding::encode(object)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_media_url_encodes_object_name() {
        let url = public_media_url(
            "firebasestorage.googleapis.com",
            "certify-demo.appspot.com",
            "faces/jane doe.jpg",
        );
        assert_eq!(
            url,
            "https://firebasestorage.googleapis.com/v0/b/certify-demo.appspot.com/o/faces%2Fjane%20doe.jpg?alt=media"
        );
    }

    #[test]
    fn test_public_media_url_tolerates_trailing_slash() {
        let url = public_media_url("storage.local/", "b", "faces/a.png");
        assert_eq!(url, "https://storage.local/v0/b/b/o/faces%2Fa.png?alt=media");
    }
}
