//! Asset associator
//!
//! Resolves a record's optional local image into a public URL. Upload
//! failures are logged and swallowed: a record never fails because of its
//! image.

use std::path::Path;
use std::sync::Arc;

use crate::stores::{AssetTransfer, UploadOptions};

/// Object name prefix used when none is configured
pub const DEFAULT_OBJECT_PREFIX: &str = "faces";

/// Content type used when the file signature is not recognized
pub const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

pub struct AssetAssociator {
    transfer: Arc<dyn AssetTransfer>,
    object_prefix: String,
}

impl AssetAssociator {
    pub fn new(transfer: Arc<dyn AssetTransfer>, object_prefix: impl Into<String>) -> Self {
        Self {
            transfer,
            object_prefix: object_prefix.into(),
        }
    }

    /// Object name for a local file: `<prefix>/<basename>`
    ///
    /// Only the basename is used, so the same file always maps to the same
    /// object and a re-run overwrites it.
    pub fn destination_for(&self, local_path: &Path) -> String {
        let basename = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| local_path.to_string_lossy().into_owned());

        let prefix = self.object_prefix.trim_matches('/');
        if prefix.is_empty() {
            basename
        } else {
            format!("{}/{}", prefix, basename)
        }
    }

    /// Upload `local_path` (when present) and return its public URL
    ///
    /// Returns `None` when there is no path or the upload failed.
    pub async fn resolve(&self, email: &str, local_path: Option<&Path>) -> Option<String> {
        let local_path = local_path?;
        let destination = self.destination_for(local_path);
        let options = UploadOptions {
            public: true,
            content_type: detect_content_type(local_path),
        };

        match self.transfer.upload(local_path, &destination, &options).await {
            Ok(url) => {
                tracing::debug!(email = %email, object = %destination, "Image uploaded");
                Some(url)
            }
            Err(e) => {
                tracing::warn!(
                    email = %email,
                    path = %local_path.display(),
                    error = %e,
                    "Image upload failed, continuing without image"
                );
                None
            }
        }
    }
}

/// Sniff the file signature; unreadable or unknown files get the fallback
fn detect_content_type(local_path: &Path) -> String {
    match infer::get_from_path(local_path) {
        Ok(Some(kind)) => kind.mime_type().to_string(),
        _ => FALLBACK_CONTENT_TYPE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetTransferError;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records every upload and answers with a fixed URL or a rejection
    struct StubTransfer {
        reject: bool,
        uploads: Mutex<Vec<(PathBuf, String, UploadOptions)>>,
    }

    impl StubTransfer {
        fn new(reject: bool) -> Arc<Self> {
            Arc::new(Self {
                reject,
                uploads: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl AssetTransfer for StubTransfer {
        async fn upload(
            &self,
            local_path: &Path,
            destination: &str,
            options: &UploadOptions,
        ) -> Result<String, AssetTransferError> {
            self.uploads.lock().unwrap().push((
                local_path.to_path_buf(),
                destination.to_string(),
                options.clone(),
            ));
            if self.reject {
                return Err(AssetTransferError::Rejected {
                    status: 403,
                    body: "permission denied".to_string(),
                });
            }
            Ok(format!("https://storage.test/{}", destination))
        }
    }

    #[test]
    fn test_destination_uses_prefix_and_basename() {
        let associator = AssetAssociator::new(StubTransfer::new(false), "faces");
        assert_eq!(
            associator.destination_for(Path::new("/home/ops/photos/ann.jpg")),
            "faces/ann.jpg"
        );

        let bare = AssetAssociator::new(StubTransfer::new(false), "/");
        assert_eq!(bare.destination_for(Path::new("ann.jpg")), "ann.jpg");
    }

    #[tokio::test]
    async fn test_no_path_skips_upload() {
        let transfer = StubTransfer::new(false);
        let associator = AssetAssociator::new(transfer.clone(), DEFAULT_OBJECT_PREFIX);

        assert_eq!(associator.resolve("a@x.com", None).await, None);
        assert!(transfer.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_is_public_with_sniffed_content_type() {
        let temp_dir = TempDir::new().unwrap();
        let image = temp_dir.path().join("ann.png");
        std::fs::write(&image, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0]).unwrap();

        let transfer = StubTransfer::new(false);
        let associator = AssetAssociator::new(transfer.clone(), DEFAULT_OBJECT_PREFIX);

        let url = associator.resolve("a@x.com", Some(&image)).await;

        assert_eq!(url.as_deref(), Some("https://storage.test/faces/ann.png"));
        let uploads = transfer.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].2.public);
        assert_eq!(uploads[0].2.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_unknown_content_falls_back_to_jpeg() {
        let temp_dir = TempDir::new().unwrap();
        let image = temp_dir.path().join("ann.jpg");
        std::fs::write(&image, b"not really an image").unwrap();

        let transfer = StubTransfer::new(false);
        let associator = AssetAssociator::new(transfer.clone(), DEFAULT_OBJECT_PREFIX);
        associator.resolve("a@x.com", Some(&image)).await;

        assert_eq!(transfer.uploads.lock().unwrap()[0].2.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_rejected_upload_resolves_to_none() {
        let transfer = StubTransfer::new(true);
        let associator = AssetAssociator::new(transfer.clone(), DEFAULT_OBJECT_PREFIX);

        let url = associator
            .resolve("a@x.com", Some(Path::new("/missing/ann.jpg")))
            .await;

        assert_eq!(url, None);
        assert_eq!(transfer.uploads.lock().unwrap().len(), 1);
    }
}
