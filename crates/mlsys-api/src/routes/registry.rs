use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use super::StatusResponse;
use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RegistryParams {
    /// Environment: dev, staging or prod
    pub env: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/model-registry", get(model_registry))
}

/// Scan the environment's model bucket into its catalog table
#[utoipa::path(
    get,
    path = "/model-registry",
    params(RegistryParams),
    responses(
        (status = 200, description = "Models registered", body = StatusResponse),
        (status = 400, description = "Missing query parameter"),
        (status = 500, description = "Scan failed", body = crate::error::ErrorResponse)
    ),
    tag = "registry"
)]
pub async fn model_registry(
    State(state): State<AppState>,
    Query(params): Query<RegistryParams>,
) -> Result<Json<StatusResponse>, ApiError> {
    let report = state.registry_scanner.scan(&params.env).await?;
    info!(
        "Registered {} models from gs://{} ({} skipped)",
        report.registered.len(),
        report.bucket,
        report.skipped.len()
    );

    Ok(Json(StatusResponse::success(format!(
        "Models registered for {} environment",
        params.env
    ))))
}
