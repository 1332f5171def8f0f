//! Application wiring
//!
//! Builds the object store and warehouse selected by [`MlsysConfig`] once and
//! hands them to the prediction and registry services.

use std::sync::Arc;
use tracing::info;

use crate::config::MlsysConfig;
use crate::error::Result;
use crate::gcp::GcpAuth;
use crate::prediction::PredictionService;
use crate::registry::{EventRegistrar, RegistryScanner};
use crate::storage::{
    GcsObjectStore, InMemoryObjectStore, LocalObjectStore, ObjectStore, StorageConfig,
};
use crate::warehouse::{BigQueryWarehouse, InMemoryWarehouse, Warehouse, WarehouseConfig};

/// The mlsys application: configuration plus the backends every service shares
#[derive(Clone)]
pub struct MlsysApp {
    config: Arc<MlsysConfig>,
    store: Arc<dyn ObjectStore>,
    warehouse: Arc<dyn Warehouse>,
}

impl MlsysApp {
    /// Build the backends named by `config`
    pub fn from_config(config: MlsysConfig) -> Result<Self> {
        MlsysAppBuilder::new(config).build()
    }

    pub fn builder(config: MlsysConfig) -> MlsysAppBuilder {
        MlsysAppBuilder::new(config)
    }

    pub fn config(&self) -> &MlsysConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    pub fn warehouse(&self) -> Arc<dyn Warehouse> {
        self.warehouse.clone()
    }

    pub fn prediction_service(&self) -> PredictionService {
        PredictionService::new(self.warehouse.clone(), self.store.clone(), self.config.clone())
    }

    pub fn registry_scanner(&self) -> RegistryScanner {
        RegistryScanner::new(self.store.clone(), self.warehouse.clone(), self.config.clone())
    }

    pub fn event_registrar(&self) -> EventRegistrar {
        EventRegistrar::new(self.warehouse.clone(), self.config.clone())
    }
}

/// Builder for [`MlsysApp`]; injected backends take precedence over the configured ones
pub struct MlsysAppBuilder {
    config: MlsysConfig,
    store: Option<Arc<dyn ObjectStore>>,
    warehouse: Option<Arc<dyn Warehouse>>,
    client: Option<reqwest::Client>,
}

impl MlsysAppBuilder {
    pub fn new(config: MlsysConfig) -> Self {
        Self {
            config,
            store: None,
            warehouse: None,
            client: None,
        }
    }

    /// Use this object store instead of the configured backend
    pub fn store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use this warehouse instead of the configured backend
    pub fn warehouse(mut self, warehouse: Arc<dyn Warehouse>) -> Self {
        self.warehouse = Some(warehouse);
        self
    }

    /// HTTP client shared by the Google Cloud backends
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<MlsysApp> {
        let client = self.client.unwrap_or_default();
        let auth = GcpAuth::new(client.clone(), self.config.access_token.clone());

        let store: Arc<dyn ObjectStore> = match self.store {
            Some(store) => store,
            None => match &self.config.storage {
                StorageConfig::Gcs { endpoint } => {
                    info!("Using Cloud Storage at {}", endpoint);
                    Arc::new(GcsObjectStore::with_endpoint(
                        client.clone(),
                        auth.clone(),
                        endpoint.clone(),
                    ))
                }
                StorageConfig::Local { base_path } => {
                    info!("Using local object storage at {}", base_path);
                    Arc::new(LocalObjectStore::new(base_path))
                }
                StorageConfig::InMemory => {
                    info!("Using in-memory object storage");
                    Arc::new(InMemoryObjectStore::new())
                }
            },
        };

        let warehouse: Arc<dyn Warehouse> = match self.warehouse {
            Some(warehouse) => warehouse,
            None => match &self.config.warehouse {
                WarehouseConfig::BigQuery { endpoint, location } => {
                    let project = self.config.require_project()?;
                    info!("Using BigQuery project {} at {}", project, endpoint);
                    Arc::new(
                        BigQueryWarehouse::new(client.clone(), auth.clone(), project)
                            .with_endpoint(endpoint.clone())
                            .with_location(location.clone()),
                    )
                }
                WarehouseConfig::InMemory => {
                    info!("Using in-memory warehouse");
                    Arc::new(InMemoryWarehouse::new())
                }
            },
        };

        Ok(MlsysApp {
            config: Arc::new(self.config),
            store,
            warehouse,
        })
    }
}
