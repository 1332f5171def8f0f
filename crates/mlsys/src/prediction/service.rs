use chrono::{DateTime, Utc};
use mlsys_core::{CoreError, DataType, Field, Predictor, Table, Value};
use std::sync::Arc;
use tracing::info;

use super::model::{BatchPredictionJob, PredictionRequest, PredictionSummary, batch_columns};
use crate::config::MlsysConfig;
use crate::error::Result;
use crate::registry::model_path;
use crate::storage::ObjectStore;
use crate::warehouse::{Warehouse, WriteMode};

/// Runs models from object storage over warehouse tables
#[derive(Clone)]
pub struct PredictionService {
    warehouse: Arc<dyn Warehouse>,
    store: Arc<dyn ObjectStore>,
    config: Arc<MlsysConfig>,
}

impl PredictionService {
    pub fn new(
        warehouse: Arc<dyn Warehouse>,
        store: Arc<dyn ObjectStore>,
        config: Arc<MlsysConfig>,
    ) -> Self {
        Self {
            warehouse,
            store,
            config,
        }
    }

    /// Predict every row of `input_table` and append the results to `output_table`.
    ///
    /// Output columns are the configured key columns followed by the label,
    /// positive-class probability, timestamp, model name and model version.
    pub async fn predict(&self, request: &PredictionRequest) -> Result<PredictionSummary> {
        let (environment, bucket) = self.config.resolve_bucket(&request.env)?;

        info!("Loading data from {}", request.input_table);
        let input = self
            .warehouse
            .query(&format!("SELECT * FROM {}", request.input_table))
            .await?;
        info!("Loaded {} rows", input.num_rows());

        let path = model_path(&request.model_name, &request.model_version);
        info!("Loading model gs://{}/{} ({})", bucket, path, environment);
        let model = self.store.get_model(&bucket, &path).await?;

        let labels = model.predict(&input)?;
        check_len(&input, labels.len())?;
        let probabilities = model.predict_proba(&input)?;
        check_len(&input, probabilities.len())?;
        let predicted_at = Utc::now();

        let columns = &self.config.prediction;
        let output = input
            .select(columns.key_columns.as_slice())?
            .with_column(
                Field::new(&columns.label_column, DataType::Int64),
                labels.into_iter().map(Value::Int).collect(),
            )?
            .with_column(
                Field::new(&columns.probability_column, DataType::Float64),
                probabilities.iter().map(|p| Value::Float(p[1])).collect(),
            )?;
        let output = stamp(
            output,
            [
                columns.timestamp_column.as_str(),
                columns.model_name_column.as_str(),
                columns.model_version_column.as_str(),
            ],
            predicted_at,
            &request.model_name,
            &request.model_version,
        )?;

        info!("Writing {} predictions to {}", output.num_rows(), request.output_table);
        self.warehouse
            .load(&output, &request.output_table, WriteMode::Append)
            .await?;

        Ok(PredictionSummary {
            output_table: request.output_table.clone(),
            rows: output.num_rows(),
            predicted_at,
        })
    }

    /// Run a query, predict labels with the model in `job.model_bucket`, and
    /// append every input column plus the prediction to `job.output_table_id`.
    pub async fn pull_predict_push(&self, job: &BatchPredictionJob) -> Result<PredictionSummary> {
        info!("Running input query");
        let input = self.warehouse.query(&job.input_query).await?;
        info!("Loaded {} rows", input.num_rows());

        let path = model_path(&job.model_name, &job.model_version);
        info!("Loading model gs://{}/{}", job.model_bucket, path);
        let model = self.store.get_model(&job.model_bucket, &path).await?;

        let labels = model.predict(&input)?;
        check_len(&input, labels.len())?;
        let predicted_at = Utc::now();

        let output = input.with_column(
            Field::new(batch_columns::PREDICTION, DataType::Int64),
            labels.into_iter().map(Value::Int).collect(),
        )?;
        let output = stamp(
            output,
            [
                batch_columns::PREDICTION_TIMESTAMP,
                batch_columns::MODEL_NAME,
                batch_columns::MODEL_VERSION,
            ],
            predicted_at,
            &job.model_name,
            &job.model_version,
        )?;

        info!("Writing {} predictions to {}", output.num_rows(), job.output_table_id);
        self.warehouse
            .load(&output, &job.output_table_id, WriteMode::Append)
            .await?;

        Ok(PredictionSummary {
            output_table: job.output_table_id.clone(),
            rows: output.num_rows(),
            predicted_at,
        })
    }
}

fn check_len(input: &Table, actual: usize) -> std::result::Result<(), CoreError> {
    if actual != input.num_rows() {
        return Err(CoreError::ShapeMismatch {
            expected: input.num_rows(),
            actual,
        });
    }
    Ok(())
}

/// Append timestamp, model name and model version columns, in that order
fn stamp(
    table: Table,
    [timestamp, name, version]: [&str; 3],
    predicted_at: DateTime<Utc>,
    model_name: &str,
    model_version: &str,
) -> std::result::Result<Table, CoreError> {
    table
        .with_constant(Field::new(timestamp, DataType::Timestamp), Value::Timestamp(predicted_at))?
        .with_constant(Field::new(name, DataType::String), Value::from(model_name))?
        .with_constant(Field::new(version, DataType::String), Value::from(model_version))
}
