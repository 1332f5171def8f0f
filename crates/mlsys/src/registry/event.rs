use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::entry::{EventCatalogEntry, StorageEvent};
use super::path::parse_artifact_path;
use crate::config::MlsysConfig;
use crate::environment::Environment;
use crate::error::{MlsysError, Result};
use crate::warehouse::Warehouse;

/// Dataset and table receiving event registrations
pub const EVENT_CATALOG: &str = "ml_registry.models";

/// Registers a single uploaded artifact from its storage event
#[derive(Clone)]
pub struct EventRegistrar {
    warehouse: Arc<dyn Warehouse>,
    config: Arc<MlsysConfig>,
}

impl EventRegistrar {
    pub fn new(warehouse: Arc<dyn Warehouse>, config: Arc<MlsysConfig>) -> Self {
        Self { warehouse, config }
    }

    pub fn catalog_table(&self) -> Result<String> {
        Ok(format!("{}.{}", self.config.require_project()?, EVENT_CATALOG))
    }

    /// Write one catalog row for `event`.
    ///
    /// Events from buckets without an environment suffix are ignored and yield
    /// `None`. Only `<name>/v<N>/model.pkl` objects are registered; sidecars such
    /// as `metadata.json` uploaded next to a model are ignored the same way.
    pub async fn register(&self, event: &StorageEvent) -> Result<Option<EventCatalogEntry>> {
        let Some(environment) = Environment::from_bucket_suffix(&event.bucket) else {
            info!("Unknown environment for bucket {}, ignoring event", event.bucket);
            return Ok(None);
        };

        let artifact = match parse_artifact_path(&event.name) {
            Ok(artifact) => artifact,
            Err(reason) => {
                info!("Ignoring gs://{}/{}: {}", event.bucket, event.name, reason);
                return Ok(None);
            }
        };

        let table_id = self.catalog_table()?;
        let entry = EventCatalogEntry {
            model_name: artifact.model_name,
            model_version: artifact.version,
            environment,
            gcs_bucket: event.bucket.clone(),
            gcs_path: event.name.clone(),
            file_size_bytes: event.size,
            upload_timestamp: event.time_created.clone(),
            uploader: event.uploader().to_string(),
            registered_at: Utc::now(),
        };

        let row = serde_json::to_value(&entry)?;
        let errors = self.warehouse.insert_rows(&table_id, vec![row]).await?;
        if !errors.is_empty() {
            warn!("Registration of gs://{}/{} rejected", event.bucket, event.name);
            return Err(MlsysError::CatalogWrite {
                table: table_id,
                errors,
            });
        }

        info!(
            "Registered model {} v{} ({}) in {}",
            entry.model_name, entry.model_version, environment, table_id
        );
        Ok(Some(entry))
    }
}
