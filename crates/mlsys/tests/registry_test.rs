use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mlsys::registry::StorageEvent;
use mlsys::storage::{BlobInfo, InMemoryObjectStore, ObjectStore, StorageError, StorageResult};
use mlsys::warehouse::{InMemoryWarehouse, RowInsertError, Warehouse, WarehouseResult, WriteMode};
use mlsys::{MlsysApp, MlsysConfig, MlsysError, Table};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const METADATA: &str = r#"{"description": "Titanic survival model", "accuracy": 0.85}"#;

fn test_config() -> MlsysConfig {
    let mut config = MlsysConfig {
        project_id: Some("test-project".to_string()),
        ..MlsysConfig::default()
    };
    config.buckets.dev = Some("mlsys-models-dev".to_string());
    config.buckets.staging = Some("mlsys-models-staging".to_string());
    config.buckets.prod = Some("mlsys-models-prod".to_string());
    config
}

/// Two artifacts, a sidecar, and two blobs off the naming convention
fn seeded_store(bucket: &str) -> InMemoryObjectStore {
    let store = InMemoryObjectStore::new();
    let day = |d| Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0).unwrap();
    store
        .insert_blob(bucket, "titanic-survival/v1/model.pkl", vec![0u8; 2048], day(1))
        .unwrap();
    store
        .insert_blob(bucket, "fraud-detection/v2/model.pkl", vec![0u8; 4096], day(2))
        .unwrap();
    store
        .insert_blob(bucket, "titanic-survival/v1/metadata.json", METADATA, day(1))
        .unwrap();
    store
        .insert_blob(bucket, "invalid/model.pkl", vec![0u8; 16], day(3))
        .unwrap();
    store
        .insert_blob(bucket, "test-model/version1/model.pkl", vec![0u8; 16], day(3))
        .unwrap();
    store
}

fn app(store: Arc<dyn ObjectStore>, warehouse: Arc<dyn Warehouse>) -> MlsysApp {
    MlsysApp::builder(test_config())
        .store(store)
        .warehouse(warehouse)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_scan_registers_valid_artifacts() {
    let store = Arc::new(seeded_store("mlsys-models-dev"));
    let warehouse = Arc::new(InMemoryWarehouse::new());
    let app = app(store, warehouse.clone());

    let report = app.registry_scanner().scan("dev").await.unwrap();
    assert_eq!(report.registered.len(), 2);
    assert_eq!(
        report.table_id.as_deref(),
        Some("test-project.mlsys_dev.model_registry")
    );
    assert_eq!(
        report.skipped,
        vec![
            "titanic-survival/v1/metadata.json",
            "invalid/model.pkl",
            "test-model/version1/model.pkl"
        ]
    );

    assert_eq!(warehouse.insert_calls(), 1);
    let rows = warehouse.inserted_rows("test-project.mlsys_dev.model_registry");
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0]["model_name"], "titanic-survival");
    assert_eq!(rows[0]["model_version"], 1);
    assert_eq!(rows[0]["environment"], "dev");
    assert_eq!(rows[0]["gcs_bucket"], "mlsys-models-dev");
    assert_eq!(rows[0]["file_size_bytes"], 2048);
    assert_eq!(rows[0]["upload_timestamp"], "2025-01-01T00:00:00Z");
    assert_eq!(rows[0]["uploader"], "scan");
    assert_eq!(rows[0]["metadata"], METADATA);
    assert!(rows[0]["registered_at"].is_string());

    assert_eq!(rows[1]["model_name"], "fraud-detection");
    assert_eq!(rows[1]["model_version"], 2);
    assert_eq!(rows[1]["file_size_bytes"], 4096);
    assert!(rows[1]["metadata"].is_null());
}

#[tokio::test]
async fn test_scan_targets_environment_catalog() {
    for env in ["dev", "staging", "prod"] {
        let bucket = format!("mlsys-models-{}", env);
        let warehouse = Arc::new(InMemoryWarehouse::new());
        let app = app(Arc::new(seeded_store(&bucket)), warehouse.clone());

        let report = app.registry_scanner().scan(env).await.unwrap();
        assert_eq!(report.bucket, bucket);

        let table = format!("test-project.mlsys_{}.model_registry", env);
        let rows = warehouse.inserted_rows(&table);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["environment"] == env));
    }
}

#[tokio::test]
async fn test_rescan_appends_duplicates() {
    let warehouse = Arc::new(InMemoryWarehouse::new());
    let app = app(Arc::new(seeded_store("mlsys-models-dev")), warehouse.clone());

    let scanner = app.registry_scanner();
    scanner.scan("dev").await.unwrap();
    scanner.scan("dev").await.unwrap();

    let rows = warehouse.inserted_rows("test-project.mlsys_dev.model_registry");
    assert_eq!(rows.len(), 4);
    assert_eq!(warehouse.insert_calls(), 2);
}

#[tokio::test]
async fn test_scan_without_artifacts_writes_nothing() {
    let store = InMemoryObjectStore::new();
    store
        .insert_blob("mlsys-models-dev", "titanic-survival/v1/metadata.json", METADATA, Utc::now())
        .unwrap();
    store
        .insert_blob("mlsys-models-dev", "invalid/model.pkl", vec![1u8], Utc::now())
        .unwrap();
    let warehouse = Arc::new(InMemoryWarehouse::new());
    let app = app(Arc::new(store), warehouse.clone());

    let report = app.registry_scanner().scan("dev").await.unwrap();
    assert!(report.registered.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(warehouse.insert_calls(), 0);

    let report = app.registry_scanner().scan("prod").await.unwrap();
    assert!(report.registered.is_empty());
    assert_eq!(warehouse.insert_calls(), 0);
}

#[tokio::test]
async fn test_empty_scan_needs_no_project() {
    let store = Arc::new(InMemoryObjectStore::new());
    store
        .insert_blob("ml-models-dev", "invalid/model.pkl", vec![1u8], Utc::now())
        .unwrap();
    let warehouse = Arc::new(InMemoryWarehouse::new());
    let app = MlsysApp::builder(MlsysConfig::default())
        .store(store.clone())
        .warehouse(warehouse.clone())
        .build()
        .unwrap();

    let report = app.registry_scanner().scan("dev").await.unwrap();
    assert!(report.registered.is_empty());
    assert_eq!(report.table_id, None);
    assert_eq!(report.skipped, vec!["invalid/model.pkl"]);
    assert_eq!(warehouse.insert_calls(), 0);

    // A registrable artifact does need a catalog to write to
    store
        .insert_blob("ml-models-dev", "titanic-survival/v1/model.pkl", vec![1u8], Utc::now())
        .unwrap();
    let err = app.registry_scanner().scan("dev").await.unwrap_err();
    assert!(matches!(err, MlsysError::Config(_)));
    assert_eq!(warehouse.insert_calls(), 0);
}

/// Lists the seeded blobs but fails every download
struct UnreadableStore {
    inner: InMemoryObjectStore,
    downloads: AtomicUsize,
}

#[async_trait]
impl ObjectStore for UnreadableStore {
    async fn get_bytes(&self, bucket: &str, path: &str) -> StorageResult<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Other(format!("connection reset: gs://{}/{}", bucket, path)))
    }

    async fn put_bytes(&self, bucket: &str, path: &str, content: &[u8]) -> StorageResult<()> {
        self.inner.put_bytes(bucket, path, content).await
    }

    async fn list_blobs(&self, bucket: &str) -> StorageResult<Vec<BlobInfo>> {
        self.inner.list_blobs(bucket).await
    }
}

#[tokio::test]
async fn test_metadata_failures_are_ignored() {
    let store = Arc::new(UnreadableStore {
        inner: seeded_store("mlsys-models-dev"),
        downloads: AtomicUsize::new(0),
    });
    let warehouse = Arc::new(InMemoryWarehouse::new());
    let app = app(store.clone(), warehouse.clone());

    let report = app.registry_scanner().scan("dev").await.unwrap();
    assert_eq!(report.registered.len(), 2);
    assert!(report.registered.iter().all(|e| e.metadata.is_none()));
    assert_eq!(store.downloads.load(Ordering::SeqCst), 2);

    let rows = warehouse.inserted_rows("test-project.mlsys_dev.model_registry");
    assert!(rows.iter().all(|r| r["metadata"].is_null()));
}

#[tokio::test]
async fn test_non_utf8_metadata_is_ignored() {
    let store = seeded_store("mlsys-models-dev");
    store
        .insert_blob(
            "mlsys-models-dev",
            "titanic-survival/v1/metadata.json",
            vec![0xff, 0xfe, 0x00],
            Utc::now(),
        )
        .unwrap();
    let app = app(Arc::new(store), Arc::new(InMemoryWarehouse::new()));

    let report = app.registry_scanner().scan("dev").await.unwrap();
    assert!(report.registered.iter().all(|e| e.metadata.is_none()));
}

/// Rejects the first row of every insert
#[derive(Default)]
struct RejectingWarehouse {
    inserts: AtomicUsize,
}

#[async_trait]
impl Warehouse for RejectingWarehouse {
    async fn query(&self, sql: &str) -> WarehouseResult<Table> {
        Err(mlsys::warehouse::WarehouseError::Query(sql.to_string()))
    }

    async fn load(&self, _table: &Table, _destination: &str, _mode: WriteMode) -> WarehouseResult<()> {
        Ok(())
    }

    async fn insert_rows(
        &self,
        _table_id: &str,
        _rows: Vec<serde_json::Value>,
    ) -> WarehouseResult<Vec<RowInsertError>> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(vec![RowInsertError {
            index: 0,
            errors: vec![json!({"reason": "invalid", "message": "no such field: metadata"})],
        }])
    }
}

#[tokio::test]
async fn test_row_errors_fail_the_scan() {
    let warehouse = Arc::new(RejectingWarehouse::default());
    let app = app(Arc::new(seeded_store("mlsys-models-dev")), warehouse.clone());

    let err = app.registry_scanner().scan("dev").await.unwrap_err();
    match &err {
        MlsysError::CatalogWrite { table, errors } => {
            assert_eq!(table, "test-project.mlsys_dev.model_registry");
            assert_eq!(errors.len(), 1);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.to_string().contains("no such field: metadata"));
    assert_eq!(warehouse.inserts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scan_rejects_unknown_environment() {
    let store = Arc::new(UnreadableStore {
        inner: seeded_store("mlsys-models-dev"),
        downloads: AtomicUsize::new(0),
    });
    let warehouse = Arc::new(InMemoryWarehouse::new());
    let app = app(store.clone(), warehouse.clone());

    let err = app.registry_scanner().scan("qa").await.unwrap_err();
    assert!(matches!(err, MlsysError::InvalidEnvironment(ref env) if env == "qa"));
    assert_eq!(store.downloads.load(Ordering::SeqCst), 0);
    assert_eq!(warehouse.insert_calls(), 0);
}

fn event(bucket: &str, name: &str) -> StorageEvent {
    StorageEvent::from_json(
        &json!({
            "bucket": bucket,
            "name": name,
            "size": "2048",
            "timeCreated": "2025-01-03T10:00:00.000Z",
            "metadata": {"uploader": "trainer@example.com"}
        })
        .to_string(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_event_registers_one_row() {
    let warehouse = Arc::new(InMemoryWarehouse::new());
    let app = app(Arc::new(InMemoryObjectStore::new()), warehouse.clone());

    let entry = app
        .event_registrar()
        .register(&event("mlsys-models-staging", "titanic-survival/v3/model.pkl"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.model_version, 3);

    let rows = warehouse.inserted_rows("test-project.ml_registry.models");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row["model_name"], "titanic-survival");
    assert_eq!(row["model_version"], 3);
    assert_eq!(row["environment"], "staging");
    assert_eq!(row["gcs_bucket"], "mlsys-models-staging");
    assert_eq!(row["gcs_path"], "titanic-survival/v3/model.pkl");
    assert_eq!(row["file_size_bytes"], 2048);
    assert_eq!(row["upload_timestamp"], "2025-01-03T10:00:00.000Z");
    assert_eq!(row["uploader"], "trainer@example.com");
    assert!(row.get("metadata").is_none());
}

#[tokio::test]
async fn test_event_without_uploader() {
    let warehouse = Arc::new(InMemoryWarehouse::new());
    let app = app(Arc::new(InMemoryObjectStore::new()), warehouse.clone());

    let event = StorageEvent::from_json(
        r#"{"bucket": "ml-models-prod", "name": "churn/v12/model.pkl", "size": 99, "timeCreated": "2025-02-01T00:00:00Z"}"#,
    )
    .unwrap();
    let entry = app.event_registrar().register(&event).await.unwrap().unwrap();
    assert_eq!(entry.uploader, "unknown");
    assert_eq!(warehouse.inserted_rows("test-project.ml_registry.models").len(), 1);
}

#[tokio::test]
async fn test_event_ignores_unknown_bucket_and_foreign_objects() {
    let warehouse = Arc::new(InMemoryWarehouse::new());
    let app = app(Arc::new(InMemoryObjectStore::new()), warehouse.clone());
    let registrar = app.event_registrar();

    let ignored = [
        event("mlsys-models", "titanic-survival/v1/model.pkl"),
        event("mlsys-models-qa", "titanic-survival/v1/model.pkl"),
        event("mlsys-models-dev", "titanic-survival/v1/metadata.json"),
        event("mlsys-models-dev", "invalid/model.pkl"),
        event("mlsys-models-dev", "test-model/version1/model.pkl"),
    ];
    for event in &ignored {
        assert!(registrar.register(event).await.unwrap().is_none());
    }
    assert_eq!(warehouse.insert_calls(), 0);
}

#[tokio::test]
async fn test_event_row_error_is_fatal() {
    let warehouse = Arc::new(RejectingWarehouse::default());
    let app = app(Arc::new(InMemoryObjectStore::new()), warehouse.clone());

    let err = app
        .event_registrar()
        .register(&event("mlsys-models-dev", "titanic-survival/v1/model.pkl"))
        .await
        .unwrap_err();
    assert!(matches!(err, MlsysError::CatalogWrite { ref table, .. } if table == "test-project.ml_registry.models"));
}
