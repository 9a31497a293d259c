pub mod gcs;

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::shared::AppError;

/// External object storage for uploaded images. Objects are publicly
/// readable once written; only the returned URL is recorded.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the bytes under `path` and return the public URL.
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str)
        -> Result<String, AppError>;
}

#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

/// In-memory blob store for development and testing. Returns URLs in the
/// same scheme as the real bucket so response shapes stay realistic.
pub struct InMemoryBlobStore {
    bucket: String,
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            bucket: "local".to_string(),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the number of stored objects.
    pub async fn blob_count(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Checks whether an object exists at `path`.
    pub async fn has_blob(&self, path: &str) -> bool {
        self.blobs.read().await.contains_key(path)
    }

    /// Returns the recorded content type for `path`.
    pub async fn content_type_of(&self, path: &str) -> Option<String> {
        self.blobs
            .read()
            .await
            .get(path)
            .map(|b| b.content_type.clone())
    }

    /// Returns the stored byte length for `path`.
    pub async fn blob_len(&self, path: &str) -> Option<usize> {
        self.blobs.read().await.get(path).map(|b| b.bytes.len())
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let size = bytes.len();
        self.blobs.write().await.insert(
            path.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );

        debug!(path = %path, size, "Blob stored in memory");
        Ok(format!(
            "https://storage.googleapis.com/{}/{}",
            self.bucket, path
        ))
    }
}
