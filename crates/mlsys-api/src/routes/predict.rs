use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use mlsys::PredictionRequest;
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use super::StatusResponse;
use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PredictParams {
    /// Environment: dev, staging or prod
    pub env: String,
    /// Fully-qualified input table, e.g. `project.dataset.table`
    pub input_table: String,
    /// Fully-qualified output table
    pub output_table: String,
    pub model_name: String,
    /// Version directory, e.g. `v1`
    pub model_version: String,
}

impl From<PredictParams> for PredictionRequest {
    fn from(params: PredictParams) -> Self {
        Self {
            env: params.env,
            input_table: params.input_table,
            output_table: params.output_table,
            model_name: params.model_name,
            model_version: params.model_version,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/predict", get(predict))
}

/// Predict every row of the input table and append the results to the output table
#[utoipa::path(
    get,
    path = "/predict",
    params(PredictParams),
    responses(
        (status = 200, description = "Predictions written", body = StatusResponse),
        (status = 400, description = "Missing query parameter"),
        (status = 500, description = "Prediction failed", body = crate::error::ErrorResponse)
    ),
    tag = "predictions"
)]
pub async fn predict(
    State(state): State<AppState>,
    Query(params): Query<PredictParams>,
) -> Result<Json<StatusResponse>, ApiError> {
    let request = PredictionRequest::from(params);
    let summary = state.prediction_service.predict(&request).await?;
    info!(
        "Wrote {} predictions of {} {} to {}",
        summary.rows, request.model_name, request.model_version, summary.output_table
    );

    Ok(Json(StatusResponse::success(format!(
        "Predictions completed for {} {}",
        request.model_name, request.model_version
    ))))
}
