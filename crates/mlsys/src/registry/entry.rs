use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::environment::Environment;
use crate::error::{MlsysError, Result};

/// Uploader recorded for entries found by a bucket scan
pub const SCAN_UPLOADER: &str = "scan";

/// Uploader recorded when the storage event carries none
pub const UNKNOWN_UPLOADER: &str = "unknown";

/// Row of the per-environment catalog `{project}.mlsys_{env}.model_registry`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub model_name: String,
    pub model_version: u64,
    pub environment: Environment,
    pub gcs_bucket: String,
    pub file_size_bytes: u64,
    pub upload_timestamp: DateTime<Utc>,
    pub uploader: String,
    pub registered_at: DateTime<Utc>,
    /// Sidecar `metadata.json` text, stored verbatim
    pub metadata: Option<String>,
}

/// Row of the event catalog `{project}.ml_registry.models`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCatalogEntry {
    pub model_name: String,
    pub model_version: u64,
    pub environment: Environment,
    pub gcs_bucket: String,
    pub gcs_path: String,
    pub file_size_bytes: u64,
    /// `timeCreated` of the event, as delivered
    pub upload_timestamp: String,
    pub uploader: String,
    pub registered_at: DateTime<Utc>,
}

/// Object finalize notification delivered for a newly uploaded blob.
///
/// Fields other than these are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageEvent {
    pub bucket: String,
    pub name: String,
    #[serde(deserialize_with = "size_from_string_or_number")]
    pub size: u64,
    #[serde(rename = "timeCreated")]
    pub time_created: String,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeRepr {
    Number(u64),
    Text(String),
}

fn size_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match SizeRepr::deserialize(deserializer)? {
        SizeRepr::Number(size) => Ok(size),
        SizeRepr::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid object size {:?}", text))),
    }
}

impl StorageEvent {
    /// Parse an event payload
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| MlsysError::InvalidEvent(e.to_string()))
    }

    /// Uploader named in the object's custom metadata
    pub fn uploader(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("uploader"))
            .map(String::as_str)
            .unwrap_or(UNKNOWN_UPLOADER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_with_string_size() {
        let event = StorageEvent::from_json(
            r#"{
                "bucket": "mlsys-models-dev",
                "name": "titanic-survival/v3/model.pkl",
                "size": "2048",
                "timeCreated": "2025-01-03T10:00:00.000Z",
                "contentType": "application/octet-stream",
                "metadata": {"uploader": "trainer@example.com"}
            }"#,
        )
        .unwrap();
        assert_eq!(event.size, 2048);
        assert_eq!(event.time_created, "2025-01-03T10:00:00.000Z");
        assert_eq!(event.uploader(), "trainer@example.com");
    }

    #[test]
    fn test_event_defaults_and_errors() {
        let event = StorageEvent::from_json(
            r#"{"bucket": "b-dev", "name": "m/v1/model.pkl", "size": 10, "timeCreated": "t"}"#,
        )
        .unwrap();
        assert_eq!(event.size, 10);
        assert_eq!(event.uploader(), "unknown");

        let err = StorageEvent::from_json(
            r#"{"bucket": "b-dev", "name": "m/v1/model.pkl", "size": "ten", "timeCreated": "t"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, MlsysError::InvalidEvent(_)));

        let err = StorageEvent::from_json(r#"{"bucket": "b-dev"}"#).unwrap_err();
        assert!(matches!(err, MlsysError::InvalidEvent(_)));
    }

    #[test]
    fn test_catalog_entry_columns() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let entry = CatalogEntry {
            model_name: "titanic-survival".to_string(),
            model_version: 1,
            environment: Environment::Dev,
            gcs_bucket: "mlsys-models-dev".to_string(),
            file_size_bytes: 2048,
            upload_timestamp: at,
            uploader: SCAN_UPLOADER.to_string(),
            registered_at: at,
            metadata: None,
        };
        let row = serde_json::to_value(&entry).unwrap();
        assert_eq!(row["environment"], "dev");
        assert_eq!(row["model_version"], 1);
        assert_eq!(row["upload_timestamp"], "2025-01-01T00:00:00Z");
        assert!(row["metadata"].is_null());

        let mut keys: Vec<&String> = row.as_object().unwrap().keys().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "environment",
                "file_size_bytes",
                "gcs_bucket",
                "metadata",
                "model_name",
                "model_version",
                "registered_at",
                "upload_timestamp",
                "uploader"
            ]
        );
    }
}
