use mlsys::storage::ObjectStore;
use mlsys::{MlsysApp, ModelArtifact};
use std::path::Path;

use crate::error::CliError;

/// Upload a local file; with `as_model` the file must be a valid model artifact
pub async fn run_upload(
    app: &MlsysApp,
    bucket: &str,
    path: &str,
    file: &Path,
    as_model: bool,
) -> Result<(), CliError> {
    let content = std::fs::read(file)?;
    let store = app.store();

    if as_model {
        let artifact = ModelArtifact::from_bytes(&content).map_err(|e| {
            CliError::InvalidInput(format!("{} is not a model artifact: {}", file.display(), e))
        })?;
        store
            .put_model(bucket, path, &artifact)
            .await
            .map_err(mlsys::MlsysError::from)?;
    } else {
        store
            .put_bytes(bucket, path, &content)
            .await
            .map_err(mlsys::MlsysError::from)?;
    }

    println!("✅ Uploaded {} to gs://{}/{}", file.display(), bucket, path);
    Ok(())
}
