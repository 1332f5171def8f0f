use async_trait::async_trait;
use mlsys_core::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{AsRefStr, Display, EnumString};

use super::{WarehouseError, WarehouseResult};

/// Default endpoint of the BigQuery REST API
pub const BIGQUERY_ENDPOINT: &str = "https://bigquery.googleapis.com";

/// Warehouse backend selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum WarehouseConfig {
    #[serde(rename = "bigquery")]
    BigQuery {
        #[serde(default = "default_bigquery_endpoint")]
        endpoint: String,
        /// Job location, e.g. "US" or "europe-west1"
        #[serde(default)]
        location: Option<String>,
    },
    InMemory,
}

fn default_bigquery_endpoint() -> String {
    BIGQUERY_ENDPOINT.to_string()
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        WarehouseConfig::BigQuery {
            endpoint: default_bigquery_endpoint(),
            location: None,
        }
    }
}

/// What a load does with rows already in the destination table
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum WriteMode {
    /// Add rows
    #[default]
    #[strum(serialize = "WRITE_APPEND")]
    #[serde(rename = "WRITE_APPEND")]
    Append,
    /// Replace all rows
    #[strum(serialize = "WRITE_TRUNCATE")]
    #[serde(rename = "WRITE_TRUNCATE")]
    Truncate,
    /// Fail unless the destination is empty
    #[strum(serialize = "WRITE_EMPTY")]
    #[serde(rename = "WRITE_EMPTY")]
    EmptyOnly,
}

/// Per-row failure reported by a streaming insert, kept verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowInsertError {
    pub index: usize,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

/// Fully-qualified `project.dataset.table` identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableId {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableId {
    /// Parse `project.dataset.table`; `dataset.table` takes the default project
    pub fn parse(id: &str, default_project: Option<&str>) -> WarehouseResult<Self> {
        let trimmed = id.trim().trim_matches('`');
        let parts: Vec<&str> = trimmed.split('.').collect();
        let (project, dataset, table) = match parts.as_slice() {
            [project, dataset, table] => (project.to_string(), *dataset, *table),
            [dataset, table] => match default_project {
                Some(project) => (project.to_string(), *dataset, *table),
                None => return Err(WarehouseError::InvalidTableId(id.to_string())),
            },
            _ => return Err(WarehouseError::InvalidTableId(id.to_string())),
        };
        if project.is_empty() || dataset.is_empty() || table.is_empty() {
            return Err(WarehouseError::InvalidTableId(id.to_string()));
        }
        Ok(Self {
            project,
            dataset: dataset.to_string(),
            table: table.to_string(),
        })
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Tabular data warehouse
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Run a query verbatim and return the complete result
    async fn query(&self, sql: &str) -> WarehouseResult<Table>;

    /// Load a table into `destination`, waiting for the load job to finish
    async fn load(&self, table: &Table, destination: &str, mode: WriteMode)
    -> WarehouseResult<()>;

    /// Streaming insert of JSON rows; returns the per-row errors the backend reported
    async fn insert_rows(
        &self,
        table_id: &str,
        rows: Vec<serde_json::Value>,
    ) -> WarehouseResult<Vec<RowInsertError>>;
}
