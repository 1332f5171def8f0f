use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use super::traits::BlobInfo;
use super::{ObjectStore, StorageError, StorageResult};

#[derive(Debug, Clone)]
struct StoredBlob {
    name: String,
    content: Vec<u8>,
    created_at: DateTime<Utc>,
}

/// In-memory implementation of ObjectStore for testing and development.
///
/// Listing returns blobs in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    buckets: RwLock<HashMap<String, Vec<StoredBlob>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob with an explicit creation time
    pub fn insert_blob(
        &self,
        bucket: &str,
        name: &str,
        content: impl Into<Vec<u8>>,
        created_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let mut buckets = self.buckets.write().map_err(|e| {
            StorageError::Other(format!("Failed to acquire write lock: {}", e))
        })?;
        let blobs = buckets.entry(bucket.to_string()).or_default();
        let blob = StoredBlob {
            name: name.to_string(),
            content: content.into(),
            created_at,
        };
        match blobs.iter_mut().find(|b| b.name == name) {
            Some(existing) => *existing = blob,
            None => blobs.push(blob),
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_bytes(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>> {
        let buckets = self.buckets.read().map_err(|e| {
            StorageError::Other(format!("Failed to acquire read lock: {}", e))
        })?;
        buckets
            .get(bucket)
            .and_then(|blobs| blobs.iter().find(|b| b.name == path))
            .map(|b| b.content.clone())
            .ok_or_else(|| StorageError::NotFound(format!("gs://{}/{}", bucket, path)))
    }

    async fn put_bytes(&self, bucket: &str, path: &str, content: &[u8]) -> StorageResult<()> {
        self.insert_blob(bucket, path, content, Utc::now())
    }

    async fn list_blobs(&self, bucket: &str) -> StorageResult<Vec<BlobInfo>> {
        let buckets = self.buckets.read().map_err(|e| {
            StorageError::Other(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(buckets
            .get(bucket)
            .map(|blobs| {
                blobs
                    .iter()
                    .map(|b| BlobInfo {
                        name: b.name.clone(),
                        size: b.content.len() as u64,
                        created_at: b.created_at,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
