//! Predictor trait implemented by every loaded model

use std::sync::Arc;

use crate::{Result, Table};

/// A trained model that scores the rows of a table.
///
/// Both methods must return exactly one entry per input row.
pub trait Predictor: Send + Sync {
    /// Predicted class label per row
    fn predict(&self, input: &Table) -> Result<Vec<i64>>;

    /// Class probabilities per row as `[negative, positive]`
    fn predict_proba(&self, input: &Table) -> Result<Vec<[f64; 2]>>;
}

/// A boxed predictor for dynamic dispatch
pub type BoxedPredictor = Box<dyn Predictor>;

/// Arc-wrapped predictor for thread-safe sharing
pub type SharedPredictor = Arc<dyn Predictor>;

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(&self, input: &Table) -> Result<Vec<i64>> {
        (**self).predict(input)
    }

    fn predict_proba(&self, input: &Table) -> Result<Vec<[f64; 2]>> {
        (**self).predict_proba(input)
    }
}

impl<P: Predictor + ?Sized> Predictor for Arc<P> {
    fn predict(&self, input: &Table) -> Result<Vec<i64>> {
        (**self).predict(input)
    }

    fn predict_proba(&self, input: &Table) -> Result<Vec<[f64; 2]>> {
        (**self).predict_proba(input)
    }
}
