use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Served prediction over a whole input table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// `dev`, `staging` or `prod`
    pub env: String,
    pub input_table: String,
    pub output_table: String,
    pub model_name: String,
    /// Version directory, e.g. `v1`
    pub model_version: String,
}

/// Batch prediction over an arbitrary query, reading the model from an explicit bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPredictionJob {
    pub input_query: String,
    pub output_table_id: String,
    pub model_bucket: String,
    pub model_name: String,
    pub model_version: String,
}

/// What a prediction run wrote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub output_table: String,
    pub rows: usize,
    pub predicted_at: DateTime<Utc>,
}

/// Column names of the batch output, after the copied input columns
pub mod batch_columns {
    pub const PREDICTION: &str = "prediction";
    pub const PREDICTION_TIMESTAMP: &str = "prediction_timestamp";
    pub const MODEL_NAME: &str = "model_name";
    pub const MODEL_VERSION: &str = "model_version";
}
