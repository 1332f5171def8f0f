use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use super::traits::{BlobInfo, GCS_ENDPOINT};
use super::{ObjectStore, StorageError, StorageResult};
use crate::gcp::GcpAuth;

/// Cloud Storage backend speaking the JSON API
#[derive(Debug, Clone)]
pub struct GcsObjectStore {
    client: reqwest::Client,
    auth: GcpAuth,
    endpoint: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectResource>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectResource {
    name: String,
    size: String,
    time_created: String,
}

impl ObjectResource {
    fn into_blob_info(self) -> StorageResult<BlobInfo> {
        let size = self.size.parse::<u64>().map_err(|e| {
            StorageError::Other(format!("Invalid size {:?} for {}: {}", self.size, self.name, e))
        })?;
        let created_at = DateTime::parse_from_rfc3339(&self.time_created)
            .map_err(|e| {
                StorageError::Other(format!(
                    "Invalid timeCreated {:?} for {}: {}",
                    self.time_created, self.name, e
                ))
            })?
            .with_timezone(&Utc);
        Ok(BlobInfo {
            name: self.name,
            size,
            created_at,
        })
    }
}

impl GcsObjectStore {
    pub fn new(client: reqwest::Client, auth: GcpAuth) -> Self {
        Self::with_endpoint(client, auth, GCS_ENDPOINT)
    }

    pub fn with_endpoint(client: reqwest::Client, auth: GcpAuth, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            auth,
            endpoint: endpoint.into(),
        }
    }

    /// Build `{endpoint}/{segments...}`, percent-encoding each segment
    fn url(&self, segments: &[&str]) -> StorageResult<Url> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| StorageError::Other(format!("Invalid endpoint {}: {}", self.endpoint, e)))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::Other(format!("Invalid endpoint {}", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check(response: reqwest::Response, what: &str) -> StorageResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(what.to_string()));
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Http(format!("{} returned {}: {}", what, status, body)))
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn get_bytes(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>> {
        let url = self.url(&["storage", "v1", "b", bucket, "o", path])?;
        let token = self.auth.token().await?;
        let what = format!("gs://{}/{}", bucket, path);

        let response = self
            .client
            .get(url)
            .query(&[("alt", "media")])
            .bearer_auth(token)
            .send()
            .await?;
        let response = Self::check(response, &what).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn put_bytes(&self, bucket: &str, path: &str, content: &[u8]) -> StorageResult<()> {
        let url = self.url(&["upload", "storage", "v1", "b", bucket, "o"])?;
        let token = self.auth.token().await?;
        let what = format!("gs://{}/{}", bucket, path);

        debug!("Uploading {} bytes to {}", content.len(), what);
        let response = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", path)])
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(content.to_vec())
            .send()
            .await?;
        Self::check(response, &what).await?;
        Ok(())
    }

    async fn list_blobs(&self, bucket: &str) -> StorageResult<Vec<BlobInfo>> {
        let url = self.url(&["storage", "v1", "b", bucket, "o"])?;
        let what = format!("gs://{}", bucket);
        let mut blobs = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = self.auth.token().await?;
            let mut request = self
                .client
                .get(url.clone())
                .query(&[("fields", "items(name,size,timeCreated),nextPageToken")])
                .bearer_auth(token);
            if let Some(page) = &page_token {
                request = request.query(&[("pageToken", page)]);
            }

            let response = Self::check(request.send().await?, &what).await?;
            let page: ObjectList = response.json().await?;
            for item in page.items {
                blobs.push(item.into_blob_info()?);
            }

            match page.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(blobs)
    }
}
