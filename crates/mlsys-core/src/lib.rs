//! # mlsys core
//!
//! Backend-independent building blocks shared by the mlsys crates: the
//! in-memory [`Table`] moved between warehouse and model, the [`Predictor`]
//! capability every loaded model exposes, and the [`ModelArtifact`] payload
//! format stored in object storage.

pub mod artifact;
pub mod error;
pub mod predictor;
pub mod table;

pub use artifact::{LinearClassifier, LogisticRegression, ModelArtifact};
pub use error::{CoreError, Result};
pub use predictor::{BoxedPredictor, Predictor, SharedPredictor};
pub use table::{DataType, Field, Table, Value};
