use thiserror::Error;

use crate::gcp::AuthError;

pub type WarehouseResult<T> = Result<T, WarehouseError>;

#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Load failed: {0}")]
    Load(String),

    #[error("Invalid table id: {0}")]
    InvalidTableId(String),

    #[error("Unexpected result schema: {0}")]
    Schema(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Warehouse error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for WarehouseError {
    fn from(err: reqwest::Error) -> Self {
        WarehouseError::Http(err.to_string())
    }
}
