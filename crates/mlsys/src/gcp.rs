//! Access tokens for the Google Cloud REST backends

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Token endpoint of the GCE / Cloud Run metadata server
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Error, Debug)]
#[error("Failed to obtain access token: {0}")]
pub struct AuthError(pub String);

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Bearer token source: a configured token, or the metadata server of the
/// runtime the service is deployed on
#[derive(Debug, Clone)]
pub struct GcpAuth {
    client: reqwest::Client,
    static_token: Option<String>,
    metadata_url: String,
}

impl GcpAuth {
    pub fn new(client: reqwest::Client, static_token: Option<String>) -> Self {
        Self {
            client,
            static_token,
            metadata_url: METADATA_TOKEN_URL.to_string(),
        }
    }

    /// Use a different metadata endpoint
    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into();
        self
    }

    pub async fn token(&self) -> Result<String, AuthError> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }

        debug!("Requesting access token from {}", self.metadata_url);
        let response = self
            .client
            .get(&self.metadata_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| AuthError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| AuthError(format!("malformed token response: {}", e)))?;
        Ok(token.access_token)
    }
}
