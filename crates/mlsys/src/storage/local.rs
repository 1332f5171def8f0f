use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::traits::BlobInfo;
use super::{ObjectStore, StorageError, StorageResult};

/// Object store on the local filesystem.
///
/// Each bucket is a directory under the base path; blob names map to
/// relative paths inside it.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    base_path: PathBuf,
}

impl LocalObjectStore {
    /// Create a new LocalObjectStore instance
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn bucket_path(&self, bucket: &str) -> StorageResult<PathBuf> {
        check_relative(bucket)?;
        Ok(self.base_path.join(bucket))
    }

    /// Get full path of a blob, refusing anything that escapes the bucket
    fn full_path(&self, bucket: &str, path: &str) -> StorageResult<PathBuf> {
        check_relative(path)?;
        Ok(self.bucket_path(bucket)?.join(path))
    }
}

fn check_relative(path: &str) -> StorageResult<()> {
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if path.is_empty() || escapes {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(())
}

fn not_found_as(err: std::io::Error, bucket: &str, path: &str) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(format!("{}/{}", bucket, path))
    } else {
        StorageError::IoError(err)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get_bytes(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>> {
        let full_path = self.full_path(bucket, path)?;
        if full_path.is_dir() {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, path)));
        }
        let mut file = fs::File::open(&full_path)
            .await
            .map_err(|e| not_found_as(e, bucket, path))?;
        let mut content = Vec::new();
        file.read_to_end(&mut content).await?;
        Ok(content)
    }

    async fn put_bytes(&self, bucket: &str, path: &str, content: &[u8]) -> StorageResult<()> {
        let full_path = self.full_path(bucket, path)?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(content).await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn list_blobs(&self, bucket: &str) -> StorageResult<Vec<BlobInfo>> {
        let root = self.bucket_path(bucket)?;
        if !root.is_dir() {
            return Err(StorageError::NotFound(format!("bucket {}", bucket)));
        }

        let mut blobs = Vec::new();
        let mut pending = vec![root.clone()];

        while let Some(dir) = pending.pop() {
            let mut read_dir = fs::read_dir(&dir).await?;
            while let Some(entry) = read_dir.next_entry().await? {
                let path = entry.path();
                let metadata = entry.metadata().await?;
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&root) else {
                    continue;
                };
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                let created_at = metadata
                    .created()
                    .or_else(|_| metadata.modified())
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());

                blobs.push(BlobInfo {
                    name,
                    size: metadata.len(),
                    created_at,
                });
            }
        }

        Ok(blobs)
    }
}
