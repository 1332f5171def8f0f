//! Serialized model artifact format.
//!
//! Artifacts are JSON documents tagged by `kind`:
//!
//! ```json
//! {
//!   "kind": "logistic_regression",
//!   "features": ["Pclass", "Sex", "Age"],
//!   "coefficients": [-0.9, -2.5, -0.03],
//!   "intercept": 3.1
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::{CoreError, Predictor, Result, Table};

/// A deserialized model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogisticRegression),
    LinearClassifier(LinearClassifier),
}

impl ModelArtifact {
    /// Decode an artifact payload
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)
            .map_err(|e| CoreError::Artifact(format!("Failed to decode artifact: {}", e)))?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Encode the artifact into its payload
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.validate()?;
        serde_json::to_vec_pretty(self)
            .map_err(|e| CoreError::Artifact(format!("Failed to encode artifact: {}", e)))
    }

    fn validate(&self) -> Result<()> {
        let (features, coefficients) = match self {
            ModelArtifact::LogisticRegression(m) => (&m.features, &m.coefficients),
            ModelArtifact::LinearClassifier(m) => (&m.features, &m.coefficients),
        };
        if features.len() != coefficients.len() {
            return Err(CoreError::Artifact(format!(
                "{} features but {} coefficients",
                features.len(),
                coefficients.len()
            )));
        }
        Ok(())
    }
}

impl Predictor for ModelArtifact {
    fn predict(&self, input: &Table) -> Result<Vec<i64>> {
        match self {
            ModelArtifact::LogisticRegression(m) => m.predict(input),
            ModelArtifact::LinearClassifier(m) => m.predict(input),
        }
    }

    fn predict_proba(&self, input: &Table) -> Result<Vec<[f64; 2]>> {
        match self {
            ModelArtifact::LogisticRegression(m) => m.predict_proba(input),
            ModelArtifact::LinearClassifier(m) => m.predict_proba(input),
        }
    }
}

fn default_threshold() -> f64 {
    0.5
}

fn default_classes() -> [i64; 2] {
    [0, 1]
}

/// Binary logistic regression over numeric feature columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub features: Vec<String>,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
    /// Positive-class probability at or above which the positive label is predicted
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Labels emitted for `[negative, positive]`
    #[serde(default = "default_classes")]
    pub classes: [i64; 2],
}

impl LogisticRegression {
    pub fn new(features: Vec<String>, coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            features,
            coefficients,
            intercept,
            threshold: default_threshold(),
            classes: default_classes(),
        }
    }

    fn positive_probabilities(&self, input: &Table) -> Result<Vec<f64>> {
        let scores = linear_scores(input, &self.features, &self.coefficients, self.intercept)?;
        Ok(scores.into_iter().map(sigmoid).collect())
    }
}

impl Predictor for LogisticRegression {
    fn predict(&self, input: &Table) -> Result<Vec<i64>> {
        Ok(self
            .positive_probabilities(input)?
            .into_iter()
            .map(|p| {
                if p >= self.threshold {
                    self.classes[1]
                } else {
                    self.classes[0]
                }
            })
            .collect())
    }

    fn predict_proba(&self, input: &Table) -> Result<Vec<[f64; 2]>> {
        Ok(self
            .positive_probabilities(input)?
            .into_iter()
            .map(|p| [1.0 - p, p])
            .collect())
    }
}

/// Linear decision function without calibrated probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub features: Vec<String>,
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
    #[serde(default = "default_classes")]
    pub classes: [i64; 2],
}

impl Predictor for LinearClassifier {
    fn predict(&self, input: &Table) -> Result<Vec<i64>> {
        let scores = linear_scores(input, &self.features, &self.coefficients, self.intercept)?;
        Ok(scores
            .into_iter()
            .map(|s| if s > 0.0 { self.classes[1] } else { self.classes[0] })
            .collect())
    }

    fn predict_proba(&self, _input: &Table) -> Result<Vec<[f64; 2]>> {
        Err(CoreError::Unsupported(
            "linear_classifier does not produce probabilities".to_string(),
        ))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn linear_scores(
    input: &Table,
    features: &[String],
    coefficients: &[f64],
    intercept: f64,
) -> Result<Vec<f64>> {
    let mut scores = vec![intercept; input.num_rows()];
    for (feature, coefficient) in features.iter().zip(coefficients) {
        for (score, value) in scores.iter_mut().zip(input.column(feature)?) {
            let x = value.as_f64().ok_or_else(|| CoreError::InvalidValue {
                column: feature.clone(),
                reason: format!("expected a numeric value, got {:?}", value),
            })?;
            *score += coefficient * x;
        }
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataType, Field, Value};

    fn scores_table(scores: &[f64]) -> Table {
        let rows = scores
            .iter()
            .enumerate()
            .map(|(i, s)| vec![Value::Int(i as i64 + 1), Value::Float(*s)])
            .collect();
        Table::new(
            vec![
                Field::new("PassengerId", DataType::Int64),
                Field::new("Score", DataType::Float64),
            ],
            rows,
        )
        .unwrap()
    }

    #[test]
    fn test_logistic_regression_predicts() {
        let model = LogisticRegression::new(vec!["Score".to_string()], vec![1.0], 0.0);
        let table = scores_table(&[-2.0, 0.0, 3.0]);

        assert_eq!(model.predict(&table).unwrap(), vec![0, 1, 1]);

        let proba = model.predict_proba(&table).unwrap();
        assert_eq!(proba.len(), 3);
        assert!((proba[1][1] - 0.5).abs() < 1e-12);
        for [neg, pos] in proba {
            assert!((neg + pos - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_artifact_roundtrip_through_bytes() {
        let artifact = ModelArtifact::LogisticRegression(LogisticRegression::new(
            vec!["Score".to_string()],
            vec![0.5],
            -0.1,
        ));
        let bytes = artifact.to_bytes().unwrap();
        assert_eq!(ModelArtifact::from_bytes(&bytes).unwrap(), artifact);
    }

    #[test]
    fn test_artifact_defaults_applied() {
        let json = br#"{"kind":"logistic_regression","features":["Score"],"coefficients":[1.0]}"#;
        match ModelArtifact::from_bytes(json).unwrap() {
            ModelArtifact::LogisticRegression(m) => {
                assert_eq!(m.threshold, 0.5);
                assert_eq!(m.classes, [0, 1]);
                assert_eq!(m.intercept, 0.0);
            }
            other => panic!("unexpected artifact {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_artifact_rejected() {
        assert!(matches!(
            ModelArtifact::from_bytes(b"\x80\x04\x95 not json"),
            Err(CoreError::Artifact(_))
        ));
        let mismatched =
            br#"{"kind":"logistic_regression","features":["a","b"],"coefficients":[1.0]}"#;
        assert!(matches!(
            ModelArtifact::from_bytes(mismatched),
            Err(CoreError::Artifact(_))
        ));
    }

    #[test]
    fn test_missing_and_invalid_features() {
        let model = LogisticRegression::new(vec!["Fare".to_string()], vec![1.0], 0.0);
        assert!(matches!(
            model.predict(&scores_table(&[1.0])),
            Err(CoreError::MissingColumn(_))
        ));

        let table = Table::new(
            vec![Field::new("Fare", DataType::String)],
            vec![vec![Value::from("cheap")]],
        )
        .unwrap();
        assert!(matches!(
            model.predict(&table),
            Err(CoreError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_linear_classifier_has_no_probabilities() {
        let model = LinearClassifier {
            features: vec!["Score".to_string()],
            coefficients: vec![1.0],
            intercept: 0.0,
            classes: [0, 1],
        };
        let table = scores_table(&[-1.0, 1.0]);
        assert_eq!(model.predict(&table).unwrap(), vec![0, 1]);
        assert!(matches!(
            model.predict_proba(&table),
            Err(CoreError::Unsupported(_))
        ));
    }
}
