use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mlsys_core::{BoxedPredictor, ModelArtifact};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{StorageError, StorageResult};

/// Default endpoint of the Cloud Storage JSON API
pub const GCS_ENDPOINT: &str = "https://storage.googleapis.com";

/// Object store backend selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    Gcs {
        #[serde(default = "default_gcs_endpoint")]
        endpoint: String,
    },
    Local {
        base_path: String,
    },
    InMemory,
}

fn default_gcs_endpoint() -> String {
    GCS_ENDPOINT.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Gcs {
            endpoint: default_gcs_endpoint(),
        }
    }
}

/// Listing entry for one blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobInfo {
    pub name: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// Blob storage addressed by bucket and path
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download the full blob
    async fn get_bytes(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>>;

    /// Upload a blob, replacing whatever is stored at `path`
    async fn put_bytes(&self, bucket: &str, path: &str, content: &[u8]) -> StorageResult<()>;

    /// List every blob of a bucket
    async fn list_blobs(&self, bucket: &str) -> StorageResult<Vec<BlobInfo>>;

    /// Upload text as UTF-8
    async fn put_text(&self, bucket: &str, path: &str, text: &str) -> StorageResult<()> {
        self.put_bytes(bucket, path, text.as_bytes()).await
    }

    /// Download and decode a model artifact
    async fn get_model(&self, bucket: &str, path: &str) -> StorageResult<BoxedPredictor> {
        let bytes = self.get_bytes(bucket, path).await?;
        debug!(
            "Decoding model artifact gs://{}/{} ({} bytes, sha256 {})",
            bucket,
            path,
            bytes.len(),
            sha256::digest(bytes.as_slice())
        );
        let artifact = ModelArtifact::from_bytes(&bytes)
            .map_err(|e| StorageError::Deserialization(format!("gs://{}/{}: {}", bucket, path, e)))?;
        Ok(Box::new(artifact))
    }

    /// Encode and upload a model artifact
    async fn put_model(
        &self,
        bucket: &str,
        path: &str,
        artifact: &ModelArtifact,
    ) -> StorageResult<()> {
        let bytes = artifact
            .to_bytes()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.put_bytes(bucket, path, &bytes).await
    }
}
