use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{MlsysError, Result};

/// Deployment tier selecting the model bucket and catalog dataset
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    /// Parse the literal names `dev`, `staging` and `prod`
    pub fn parse(value: &str) -> Result<Self> {
        Self::from_str(value).map_err(|_| MlsysError::InvalidEnvironment(value.to_string()))
    }

    /// Environment encoded in a bucket name suffix (`-dev`, `-staging`, `-prod`)
    pub fn from_bucket_suffix(bucket: &str) -> Option<Self> {
        if bucket.ends_with("-dev") {
            Some(Environment::Dev)
        } else if bucket.ends_with("-staging") {
            Some(Environment::Staging)
        } else if bucket.ends_with("-prod") {
            Some(Environment::Prod)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_parse_known_environments() {
        for env in Environment::iter() {
            assert_eq!(Environment::parse(env.as_ref()).unwrap(), env);
        }
        assert_eq!(Environment::Staging.to_string(), "staging");
    }

    #[test]
    fn test_parse_rejects_everything_else() {
        for value in ["", "Dev", "PROD", "qa", "production", " dev"] {
            let err = Environment::parse(value).unwrap_err();
            assert!(matches!(err, MlsysError::InvalidEnvironment(ref v) if v == value));
        }
    }

    #[test]
    fn test_from_bucket_suffix() {
        assert_eq!(
            Environment::from_bucket_suffix("ml-models-dev"),
            Some(Environment::Dev)
        );
        assert_eq!(
            Environment::from_bucket_suffix("ml-models-staging"),
            Some(Environment::Staging)
        );
        assert_eq!(
            Environment::from_bucket_suffix("ml-models-prod"),
            Some(Environment::Prod)
        );
        assert_eq!(Environment::from_bucket_suffix("ml-models"), None);
        assert_eq!(Environment::from_bucket_suffix("ml-models-dev-backup"), None);
    }
}
