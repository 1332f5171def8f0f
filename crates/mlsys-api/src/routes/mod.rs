use crate::AppState;
use axum::Router;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod health;
pub mod predict;
pub mod registry;

/// Success body of the business endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }
}

/// Merge all routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(predict::routes())
        .merge(registry::routes())
}
