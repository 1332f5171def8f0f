use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::environment::Environment;
use crate::error::{MlsysError, Result};
use crate::storage::StorageConfig;
use crate::warehouse::WarehouseConfig;

/// mlsys configuration.
///
/// Constructed once at startup and handed to every service; nothing reads
/// process-wide settings after that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlsysConfig {
    /// GCP project owning the catalog tables
    pub project_id: Option<String>,

    /// GCP region the service runs in
    pub region: Option<String>,

    /// Model bucket per environment
    pub buckets: BucketConfig,

    /// Object store backend
    pub storage: StorageConfig,

    /// Warehouse backend
    pub warehouse: WarehouseConfig,

    /// Bearer token for the Google APIs; the metadata server is used when unset
    pub access_token: Option<String>,

    /// Output columns of served predictions
    pub prediction: PredictionConfig,
}

impl Default for MlsysConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            region: None,
            buckets: BucketConfig::default(),
            storage: StorageConfig::default(),
            warehouse: WarehouseConfig::default(),
            access_token: None,
            prediction: PredictionConfig::default(),
        }
    }
}

/// Environment-to-bucket mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    pub dev: Option<String>,
    pub staging: Option<String>,
    pub prod: Option<String>,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            dev: Some("ml-models-dev".to_string()),
            staging: Some("ml-models-staging".to_string()),
            prod: Some("ml-models-prod".to_string()),
        }
    }
}

impl BucketConfig {
    /// Configured bucket of an environment, if any
    pub fn get(&self, env: Environment) -> Option<&str> {
        let bucket = match env {
            Environment::Dev => &self.dev,
            Environment::Staging => &self.staging,
            Environment::Prod => &self.prod,
        };
        bucket.as_deref().filter(|b| !b.is_empty())
    }
}

/// Column names written by the served prediction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Identifying columns copied forward from the input
    pub key_columns: Vec<String>,
    pub label_column: String,
    pub probability_column: String,
    pub timestamp_column: String,
    pub model_name_column: String,
    pub model_version_column: String,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            key_columns: vec!["PassengerId".to_string()],
            label_column: "Survived".to_string(),
            probability_column: "PredictionProbability".to_string(),
            timestamp_column: "PredictionTimestamp".to_string(),
            model_name_column: "ModelName".to_string(),
            model_version_column: "ModelVersion".to_string(),
        }
    }
}

impl MlsysConfig {
    /// Load from a JSON or TOML configuration file
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e)),
            _ => serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e)),
        }
    }

    /// Defaults overridden by the process environment (and a `.env` file, if present)
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let mut config = Self::default();
        config.apply_env(|key| env::var(key).ok());
        config
    }

    /// Override settings from environment variables
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(project) = var("GCP_PROJECT_ID") {
            self.project_id = Some(project);
        }
        if let Some(region) = var("GCP_REGION") {
            self.region = Some(region);
        }
        if let Some(bucket) = var("GCS_BUCKET_MODELS_DEV") {
            self.buckets.dev = Some(bucket);
        }
        if let Some(bucket) = var("GCS_BUCKET_MODELS_STAGING") {
            self.buckets.staging = Some(bucket);
        }
        if let Some(bucket) = var("GCS_BUCKET_MODELS_PROD") {
            self.buckets.prod = Some(bucket);
        }
        if let Some(token) = var("GOOGLE_OAUTH_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        match var("MLSYS_STORAGE_BACKEND").as_deref() {
            Some("local") => {
                self.storage = StorageConfig::Local {
                    base_path: var("MLSYS_LOCAL_STORAGE_PATH").unwrap_or_else(|| ".".to_string()),
                }
            }
            Some("memory") => self.storage = StorageConfig::InMemory,
            Some("gcs") => self.storage = StorageConfig::default(),
            _ => {}
        }
        match var("MLSYS_WAREHOUSE_BACKEND").as_deref() {
            Some("memory") => self.warehouse = WarehouseConfig::InMemory,
            Some("bigquery") => {
                self.warehouse = WarehouseConfig::default();
            }
            _ => {}
        }
        if let (Some(location), WarehouseConfig::BigQuery { location: slot, .. }) =
            (var("BIGQUERY_LOCATION"), &mut self.warehouse)
        {
            *slot = Some(location);
        }
    }

    /// Resolve an environment name to its model bucket.
    ///
    /// Unknown names and environments without a configured bucket are both
    /// rejected as invalid environments.
    pub fn resolve_bucket(&self, env: &str) -> Result<(Environment, String)> {
        let environment = Environment::parse(env)?;
        let bucket = self
            .buckets
            .get(environment)
            .ok_or_else(|| MlsysError::InvalidEnvironment(env.to_string()))?;
        Ok((environment, bucket.to_string()))
    }

    /// Project id, required wherever a catalog table is addressed
    pub fn require_project(&self) -> Result<&str> {
        self.project_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| MlsysError::Config("GCP_PROJECT_ID is not configured".to_string()))
    }
}
