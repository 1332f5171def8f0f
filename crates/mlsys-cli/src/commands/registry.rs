use mlsys::{MlsysApp, ScanReport};

use crate::error::CliError;

pub async fn run_registry(app: &MlsysApp, env: &str) -> Result<ScanReport, CliError> {
    let report = app.registry_scanner().scan(env).await?;

    if let Some(table_id) = &report.table_id {
        println!("📋 Registered {} models in {}:", report.registered.len(), table_id);
        for entry in &report.registered {
            println!(
                "  - {} v{} ({} bytes, uploaded {})",
                entry.model_name,
                entry.model_version,
                entry.file_size_bytes,
                entry.upload_timestamp.to_rfc3339()
            );
        }
    } else {
        println!("No models found in gs://{}", report.bucket);
    }
    if !report.skipped.is_empty() {
        println!("Skipped {} blobs:", report.skipped.len());
        for name in &report.skipped {
            println!("  - {}", name);
        }
    }

    Ok(report)
}
