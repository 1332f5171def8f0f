use axum::Router;
use mlsys::{MlsysApp, PredictionService, RegistryScanner};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod error;
pub mod routes;

pub use config::ApiConfig;
pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub prediction_service: PredictionService,
    pub registry_scanner: RegistryScanner,
}

impl AppState {
    pub fn new(app: &MlsysApp) -> Self {
        Self {
            prediction_service: app.prediction_service(),
            registry_scanner: app.registry_scanner(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::root,
        crate::routes::health::health_check,
        crate::routes::predict::predict,
        crate::routes::registry::model_registry,
    ),
    components(
        schemas(
            crate::routes::health::HealthResponse,
            crate::routes::StatusResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "predictions", description = "Batch predictions over warehouse tables"),
        (name = "registry", description = "Model registry")
    )
)]
pub struct ApiDoc;

/// Build API application
pub fn build_app(state: AppState) -> Router {
    build_app_with_config(state, &ApiConfig::default())
}

/// Build API application, mounting Swagger UI only when enabled
pub fn build_app_with_config(state: AppState, config: &ApiConfig) -> Router {
    let mut router = Router::new().merge(routes::routes());
    if config.enable_swagger {
        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }
    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
