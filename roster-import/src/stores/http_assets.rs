//! Object storage media upload client
//!
//! Uses the JSON API simple upload (`uploadType=media`): one POST per object,
//! body is the raw file. Uploading the same object name again replaces it.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use super::{public_media_url, AssetTransfer, UploadOptions};
use crate::error::AssetTransferError;

const USER_AGENT: &str = concat!("roster-import/", env!("CARGO_PKG_VERSION"));
const UPLOAD_TIMEOUT_SECS: u64 = 60;

/// Uploads to `<endpoint>/upload/storage/v1/b/<bucket>/o`
pub struct HttpAssetTransfer {
    http_client: reqwest::Client,
    upload_endpoint: String,
    bucket: String,
    public_host: String,
    access_token: Option<String>,
}

impl HttpAssetTransfer {
    pub fn new(
        upload_endpoint: impl Into<String>,
        bucket: impl Into<String>,
        public_host: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self, AssetTransferError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            upload_endpoint: upload_endpoint.into(),
            bucket: bucket.into(),
            public_host: public_host.into(),
            access_token,
        })
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o",
            self.upload_endpoint.trim_end_matches('/'),
            self.bucket
        )
    }
}

#[async_trait]
impl AssetTransfer for HttpAssetTransfer {
    async fn upload(
        &self,
        local_path: &Path,
        destination: &str,
        options: &UploadOptions,
    ) -> Result<String, AssetTransferError> {
        let body = tokio::fs::read(local_path)
            .await
            .map_err(|source| AssetTransferError::Io {
                path: local_path.display().to_string(),
                source,
            })?;

        let mut query = vec![("uploadType", "media"), ("name", destination)];
        if options.public {
            query.push(("predefinedAcl", "publicRead"));
        }

        let url = self.upload_url();
        tracing::debug!(url = %url, object = %destination, bytes = body.len(), "Uploading asset");

        let mut request = self
            .http_client
            .post(&url)
            .query(&query)
            .header(reqwest::header::CONTENT_TYPE, options.content_type.as_str())
            .body(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssetTransferError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(public_media_url(&self.public_host, &self.bucket, destination))
    }
}
