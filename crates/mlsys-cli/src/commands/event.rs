use mlsys::registry::EventCatalogEntry;
use mlsys::{MlsysApp, StorageEvent};
use std::io::Read;
use std::path::Path;

use crate::error::CliError;

/// Read an event payload from a file, or from stdin for `None` and `-`
pub fn read_event(source: Option<&Path>) -> Result<StorageEvent, CliError> {
    let payload = match source {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)?,
        _ => {
            let mut payload = String::new();
            std::io::stdin().read_to_string(&mut payload)?;
            payload
        }
    };
    Ok(StorageEvent::from_json(&payload)?)
}

pub async fn run_register_event(
    app: &MlsysApp,
    event: &StorageEvent,
) -> Result<Option<EventCatalogEntry>, CliError> {
    let entry = app.event_registrar().register(event).await?;

    match &entry {
        Some(entry) => println!(
            "✅ Registered {} v{} ({}) from gs://{}/{}",
            entry.model_name, entry.model_version, entry.environment, entry.gcs_bucket, entry.gcs_path
        ),
        None => println!("Ignored gs://{}/{}", event.bucket, event.name),
    }
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlsys::MlsysConfig;
    use mlsys::storage::InMemoryObjectStore;
    use mlsys::warehouse::InMemoryWarehouse;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_register_event_from_file() {
        let dir = std::env::temp_dir().join(format!("mlsys-cli-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("event.json");
        std::fs::write(
            &path,
            r#"{"bucket": "ml-models-dev", "name": "titanic-survival/v4/model.pkl", "size": "512", "timeCreated": "2025-03-01T12:00:00Z"}"#,
        )
        .unwrap();

        let warehouse = Arc::new(InMemoryWarehouse::new());
        let config = MlsysConfig {
            project_id: Some("p".to_string()),
            ..MlsysConfig::default()
        };
        let app = MlsysApp::builder(config)
            .store(Arc::new(InMemoryObjectStore::new()))
            .warehouse(warehouse.clone())
            .build()
            .unwrap();

        let event = read_event(Some(path.as_path())).unwrap();
        let entry = run_register_event(&app, &event).await.unwrap().unwrap();
        assert_eq!(entry.model_version, 4);
        assert_eq!(entry.uploader, "unknown");
        assert_eq!(warehouse.inserted_rows("p.ml_registry.models").len(), 1);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_read_event_missing_file() {
        let path = std::env::temp_dir().join(format!("missing-{}.json", uuid::Uuid::new_v4()));
        assert!(matches!(read_event(Some(path.as_path())), Err(CliError::Io(_))));
    }
}
