//! CLI for mlsys batch predictions and model registry

use clap::Parser;
use mlsys::BatchPredictionJob;
use mlsys_cli::{commands, error::CliError, load_app};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mlsys")]
#[command(about = "Batch predictions and model registry for mlsys", long_about = None)]
struct Cli {
    /// Service config file (JSON or TOML); read from the environment when unset
    #[arg(long, short = 'c', global = true, env = "MLSYS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "MLSYS_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a query, predict with a stored model and append the results
    Predict {
        /// Query producing the input rows
        #[arg(long, short = 'q')]
        input_query: String,

        /// Destination table, `project.dataset.table`
        #[arg(long, short = 'o')]
        output_table_id: String,

        /// Bucket holding the model
        #[arg(long, short = 'b')]
        model_bucket: String,

        #[arg(long, short = 'm')]
        model_name: String,

        /// Version directory, e.g. v1
        #[arg(long, short = 'v')]
        model_version: String,
    },
    /// Register every model artifact of an environment's bucket
    ModelRegistry {
        /// dev, staging or prod
        #[arg(long, short = 'e')]
        env: String,
    },
    /// Register one uploaded artifact from its storage event
    RegisterEvent {
        /// Event JSON file; `-` or unset reads stdin
        #[arg(long)]
        event: Option<PathBuf>,
    },
    /// Upload a file to object storage
    Upload {
        #[arg(long, short = 'b')]
        bucket: String,

        /// Destination path, e.g. titanic-survival/v1/model.pkl
        #[arg(long, short = 'p')]
        path: String,

        /// Local file
        #[arg(long, short = 'f')]
        file: PathBuf,

        /// Validate the file as a model artifact before uploading
        #[arg(long)]
        model: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    let filter = format!("mlsys={level},mlsys_cli={level}", level = cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = cli.command else {
        println!("mlsys: batch predictions and model registry");
        println!("Use --help for more information");
        return Ok(());
    };

    let app = load_app(cli.config.as_deref())?;

    match command {
        Commands::Predict {
            input_query,
            output_table_id,
            model_bucket,
            model_name,
            model_version,
        } => {
            let job = BatchPredictionJob {
                input_query,
                output_table_id,
                model_bucket,
                model_name,
                model_version,
            };
            commands::run_predict(&app, job).await?;
        }
        Commands::ModelRegistry { env } => {
            commands::run_registry(&app, &env).await?;
        }
        Commands::RegisterEvent { event } => {
            let event = commands::read_event(event.as_deref())?;
            commands::run_register_event(&app, &event).await?;
        }
        Commands::Upload {
            bucket,
            path,
            file,
            model,
        } => {
            commands::run_upload(&app, &bucket, &path, &file, model).await?;
        }
    }

    Ok(())
}
