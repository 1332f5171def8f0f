//! Main crate for mlsys
//!
//! Runs trained models stored in object storage over warehouse tables and
//! keeps a catalog of the available model artifacts.

pub mod app;
pub mod config;
pub mod environment;
pub mod error;
pub mod gcp;
pub mod prediction;
pub mod registry;
pub mod storage;
pub mod warehouse;

// Re-export core types
pub use mlsys_core::{
    CoreError, DataType, Field, LinearClassifier, LogisticRegression, ModelArtifact, Predictor,
    Table, Value,
};

pub use app::{MlsysApp, MlsysAppBuilder};
pub use config::{BucketConfig, MlsysConfig, PredictionConfig};
pub use environment::Environment;
pub use error::{MlsysError, Result};
pub use prediction::{BatchPredictionJob, PredictionRequest, PredictionService, PredictionSummary};
pub use registry::{EventRegistrar, RegistryScanner, ScanReport, StorageEvent};
