use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mlsys::MlsysError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;

/// Failure body of the business endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Every pipeline or registry failure is reported as a 500 carrying its message
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Mlsys(#[from] MlsysError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self.to_string();
        error!("Request failed: {}", detail);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { detail }),
        )
            .into_response()
    }
}
