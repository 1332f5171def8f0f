pub mod model;
pub mod service;

pub use model::{BatchPredictionJob, PredictionRequest, PredictionSummary};
pub use service::PredictionService;
