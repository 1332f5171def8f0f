//! Error types for mlsys crate

use thiserror::Error;

use crate::storage::StorageError;
use crate::warehouse::{RowInsertError, WarehouseError};

#[derive(Error, Debug)]
pub enum MlsysError {
    #[error("Invalid environment: {0}. Must be dev, staging, or prod")]
    InvalidEnvironment(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("Model error: {0}")]
    Model(#[from] mlsys_core::CoreError),

    #[error("Catalog insert into {table} failed: {}", describe_insert_errors(.errors))]
    CatalogWrite {
        table: String,
        errors: Vec<RowInsertError>,
    },

    #[error("Invalid storage event: {0}")]
    InvalidEvent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn describe_insert_errors(errors: &[RowInsertError]) -> String {
    serde_json::to_string(errors).unwrap_or_else(|_| format!("{:?}", errors))
}

pub type Result<T> = std::result::Result<T, MlsysError>;
