//! Bucket directory on local disk
//!
//! Objects land at `<bucket_root>/<destination>`; the returned URL uses the
//! same public layout as the remote store so profiles stay portable when the
//! directory is synced to a real bucket.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{public_media_url, AssetTransfer, UploadOptions};
use crate::error::AssetTransferError;

pub struct LocalAssetTransfer {
    bucket_root: PathBuf,
    bucket: String,
    public_host: String,
}

impl LocalAssetTransfer {
    pub fn new(bucket_root: PathBuf, bucket: impl Into<String>, public_host: impl Into<String>) -> Self {
        Self {
            bucket_root,
            bucket: bucket.into(),
            public_host: public_host.into(),
        }
    }

    /// Where `destination` is stored on disk
    pub fn object_path(&self, destination: &str) -> PathBuf {
        destination
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != "..")
            .fold(self.bucket_root.clone(), |path, segment| path.join(segment))
    }
}

#[async_trait]
impl AssetTransfer for LocalAssetTransfer {
    async fn upload(
        &self,
        local_path: &Path,
        destination: &str,
        _options: &UploadOptions,
    ) -> Result<String, AssetTransferError> {
        let target = self.object_path(destination);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }
        tokio::fs::copy(local_path, &target)
            .await
            .map_err(|source| io_error(local_path, source))?;

        tracing::debug!(object = %destination, target = %target.display(), "Stored asset locally");
        Ok(public_media_url(&self.public_host, &self.bucket, destination))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> AssetTransferError {
    AssetTransferError::Io {
        path: path.display().to_string(),
        source,
    }
}
