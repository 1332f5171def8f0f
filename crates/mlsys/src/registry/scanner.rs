use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::entry::{CatalogEntry, SCAN_UPLOADER};
use super::path::parse_artifact_path;
use crate::config::MlsysConfig;
use crate::environment::Environment;
use crate::error::{MlsysError, Result};
use crate::storage::ObjectStore;
use crate::warehouse::Warehouse;

/// Outcome of one bucket scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub environment: Environment,
    pub bucket: String,
    /// Catalog written to; `None` when nothing was registered
    pub table_id: Option<String>,
    pub registered: Vec<CatalogEntry>,
    /// Blob names that did not follow the artifact naming convention
    pub skipped: Vec<String>,
}

/// Inventories the model artifacts of an environment's bucket into its catalog
#[derive(Clone)]
pub struct RegistryScanner {
    store: Arc<dyn ObjectStore>,
    warehouse: Arc<dyn Warehouse>,
    config: Arc<MlsysConfig>,
}

impl RegistryScanner {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        warehouse: Arc<dyn Warehouse>,
        config: Arc<MlsysConfig>,
    ) -> Self {
        Self {
            store,
            warehouse,
            config,
        }
    }

    /// Catalog table of an environment
    pub fn catalog_table(&self, environment: Environment) -> Result<String> {
        let project = self.config.require_project()?;
        Ok(format!("{}.mlsys_{}.model_registry", project, environment))
    }

    /// Scan the bucket of `env` and append one catalog row per artifact.
    ///
    /// Rows are always appended; a rescan registers unchanged artifacts again.
    pub async fn scan(&self, env: &str) -> Result<ScanReport> {
        let (environment, bucket) = self.config.resolve_bucket(env)?;

        info!("Scanning gs://{} for {} models", bucket, environment);
        let blobs = self.store.list_blobs(&bucket).await?;

        let mut registered = Vec::new();
        let mut skipped = Vec::new();
        for blob in blobs {
            let artifact = match parse_artifact_path(&blob.name) {
                Ok(artifact) => artifact,
                Err(reason) => {
                    debug!("Skipping {}: {}", blob.name, reason);
                    skipped.push(blob.name);
                    continue;
                }
            };

            let metadata = self.fetch_metadata(&bucket, &artifact.metadata_path()).await;

            registered.push(CatalogEntry {
                model_name: artifact.model_name,
                model_version: artifact.version,
                environment,
                gcs_bucket: bucket.clone(),
                file_size_bytes: blob.size,
                upload_timestamp: blob.created_at,
                uploader: SCAN_UPLOADER.to_string(),
                registered_at: Utc::now(),
                metadata,
            });
        }

        if registered.is_empty() {
            info!("No models found in gs://{}", bucket);
            return Ok(ScanReport {
                environment,
                bucket,
                table_id: None,
                registered,
                skipped,
            });
        }

        let table_id = self.catalog_table(environment)?;

        let rows = registered
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let errors = self.warehouse.insert_rows(&table_id, rows).await?;
        if !errors.is_empty() {
            warn!("{} catalog rows rejected by {}", errors.len(), table_id);
            return Err(MlsysError::CatalogWrite {
                table: table_id,
                errors,
            });
        }

        info!("Registered {} models in {}", registered.len(), table_id);
        Ok(ScanReport {
            environment,
            bucket,
            table_id: Some(table_id),
            registered,
            skipped,
        })
    }

    /// Sidecar metadata text; absent on any failure
    async fn fetch_metadata(&self, bucket: &str, path: &str) -> Option<String> {
        match self.store.get_bytes(bucket, path).await {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Some(text),
                Err(e) => {
                    debug!("Ignoring metadata gs://{}/{}: {}", bucket, path, e);
                    None
                }
            },
            Err(e) => {
                debug!("No metadata at gs://{}/{}: {}", bucket, path, e);
                None
            }
        }
    }
}
