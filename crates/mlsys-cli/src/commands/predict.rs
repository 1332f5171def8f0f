use mlsys::{BatchPredictionJob, MlsysApp, PredictionSummary};

use crate::error::CliError;

pub async fn run_predict(
    app: &MlsysApp,
    job: BatchPredictionJob,
) -> Result<PredictionSummary, CliError> {
    println!(
        "Running {} {} from gs://{} ...",
        job.model_name, job.model_version, job.model_bucket
    );

    let summary = app.prediction_service().pull_predict_push(&job).await?;

    println!(
        "✅ Wrote {} predictions to {} at {}",
        summary.rows,
        summary.output_table,
        summary.predicted_at.to_rfc3339()
    );
    Ok(summary)
}
