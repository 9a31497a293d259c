use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::config::ServiceAccountKey;
use crate::gcp::GcpTokenSource;
use crate::shared::AppError;

use super::BlobStore;

const UPLOAD_BASE_URL: &str = "https://storage.googleapis.com/upload/storage/v1";
const PUBLIC_BASE_URL: &str = "https://storage.googleapis.com";
const SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";

/// Google Cloud Storage client using the JSON upload API with media
/// uploads. Requests authenticate with a service-account access token.
pub struct GcsBlobStore {
    bucket: String,
    upload_base_url: String,
    public_base_url: String,
    http: reqwest::Client,
    tokens: GcpTokenSource,
}

impl GcsBlobStore {
    pub fn new(key: ServiceAccountKey, bucket: String) -> Self {
        Self {
            bucket,
            upload_base_url: UPLOAD_BASE_URL.to_string(),
            public_base_url: PUBLIC_BASE_URL.to_string(),
            http: reqwest::Client::new(),
            tokens: GcpTokenSource::new(key, SCOPE),
        }
    }

    fn upload_url(&self) -> String {
        format!("{}/b/{}/o", self.upload_base_url, self.bucket)
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, path)
    }
}

#[async_trait]
impl BlobStore for GcsBlobStore {
    #[instrument(skip(self, bytes), fields(bucket = %self.bucket))]
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let token = self.tokens.bearer().await?;
        let size = bytes.len();

        let response = self
            .http
            .post(self.upload_url())
            .query(&[("uploadType", "media"), ("name", path)])
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Storage upload request failed");
                AppError::Dependency("Storage service unavailable".to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Storage upload rejected");
            return Err(AppError::Dependency(
                "Storage service rejected the upload".to_string(),
            ));
        }

        debug!(path = %path, size, "Object uploaded");
        Ok(self.public_url(path))
    }
}
