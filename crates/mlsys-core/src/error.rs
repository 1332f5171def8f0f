//! Error types for mlsys-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid value in column {column}: {reason}")]
    InvalidValue { column: String, reason: String },

    #[error("Shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Invalid model artifact: {0}")]
    Artifact(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
