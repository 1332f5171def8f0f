//! Artifact naming convention: `{model_name}/v{version}/{file}`

use std::fmt;

/// Suffix of model artifact blobs
pub const MODEL_SUFFIX: &str = ".pkl";

/// File name of the model artifact inside a version directory
pub const MODEL_FILE: &str = "model.pkl";

/// File name of the optional sidecar metadata
pub const METADATA_FILE: &str = "metadata.json";

/// Model name and version recovered from a blob path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub model_name: String,
    pub version: u64,
    /// The version segment as written, e.g. `v01`
    pub version_token: String,
}

impl ArtifactRef {
    /// Path of the sidecar metadata next to this artifact
    pub fn metadata_path(&self) -> String {
        format!("{}/{}/{}", self.model_name, self.version_token, METADATA_FILE)
    }
}

/// Why a blob path was not recognised as a model artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseSkipReason {
    NotModelFile,
    TooFewSegments(usize),
    InvalidVersion(String),
}

impl fmt::Display for ParseSkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseSkipReason::NotModelFile => write!(f, "not a {} file", MODEL_SUFFIX),
            ParseSkipReason::TooFewSegments(n) => write!(
                f,
                "invalid path format ({} segments), expected {{model_name}}/v{{version}}/{{file}}",
                n
            ),
            ParseSkipReason::InvalidVersion(token) => {
                write!(f, "invalid version format {:?}, expected v{{N}}", token)
            }
        }
    }
}

/// Path of the model artifact for a name and version token
pub fn model_path(model_name: &str, model_version: &str) -> String {
    format!("{}/{}/{}", model_name, model_version, MODEL_FILE)
}

/// Recognise `{model_name}/v{digits}/...{MODEL_SUFFIX}`.
///
/// The model name is taken verbatim; leading zeros in the version are
/// accepted. Versions that do not fit in a `u64` are rejected.
pub fn parse_artifact_path(path: &str) -> Result<ArtifactRef, ParseSkipReason> {
    if !path.ends_with(MODEL_SUFFIX) {
        return Err(ParseSkipReason::NotModelFile);
    }

    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 3 {
        return Err(ParseSkipReason::TooFewSegments(segments.len()));
    }

    let version_token = segments[1];
    let digits = version_token
        .strip_prefix('v')
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| ParseSkipReason::InvalidVersion(version_token.to_string()))?;
    let version = digits
        .parse::<u64>()
        .map_err(|_| ParseSkipReason::InvalidVersion(version_token.to_string()))?;

    Ok(ArtifactRef {
        model_name: segments[0].to_string(),
        version,
        version_token: version_token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_conventional_path() {
        let parsed = parse_artifact_path("titanic-survival/v1/model.pkl").unwrap();
        assert_eq!(parsed.model_name, "titanic-survival");
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.metadata_path(), "titanic-survival/v1/metadata.json");
    }

    #[test]
    fn test_rejections() {
        assert_eq!(
            parse_artifact_path("invalid/model.pkl"),
            Err(ParseSkipReason::TooFewSegments(2))
        );
        assert_eq!(
            parse_artifact_path("test-model/version1/model.pkl"),
            Err(ParseSkipReason::InvalidVersion("version1".to_string()))
        );
        assert_eq!(
            parse_artifact_path("titanic-survival/v1/metadata.json"),
            Err(ParseSkipReason::NotModelFile)
        );
        assert_eq!(
            parse_artifact_path("m/v/model.pkl"),
            Err(ParseSkipReason::InvalidVersion("v".to_string()))
        );
        assert_eq!(
            parse_artifact_path("m/v1a/model.pkl"),
            Err(ParseSkipReason::InvalidVersion("v1a".to_string()))
        );
        assert_eq!(
            parse_artifact_path("m/v-1/model.pkl"),
            Err(ParseSkipReason::InvalidVersion("v-1".to_string()))
        );
        assert_eq!(
            parse_artifact_path("m/v99999999999999999999999/model.pkl"),
            Err(ParseSkipReason::InvalidVersion(
                "v99999999999999999999999".to_string()
            ))
        );
    }

    #[test]
    fn test_version_details() {
        let parsed = parse_artifact_path("churn/v007/model.pkl").unwrap();
        assert_eq!(parsed.version, 7);
        assert_eq!(parsed.version_token, "v007");
        assert_eq!(parsed.metadata_path(), "churn/v007/metadata.json");

        let parsed = parse_artifact_path("churn/v10/checkpoints/model.pkl").unwrap();
        assert_eq!(parsed.version, 10);
    }

    #[test]
    fn test_model_path() {
        assert_eq!(model_path("titanic-survival", "v10"), "titanic-survival/v10/model.pkl");
    }
}
