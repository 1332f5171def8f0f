use clap::Parser;
use mlsys::{MlsysApp, MlsysConfig};
use mlsys_api::{ApiConfig, AppState, build_app_with_config};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// mlsys API Server
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Host address to bind to
    #[arg(short = 'H', long, env = "MLSYS_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on; falls back to PORT, then 8080
    #[arg(short, long, env = "MLSYS_PORT")]
    port: Option<u16>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "MLSYS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// API config file path
    #[arg(short, long, env = "MLSYS_API_CONFIG")]
    config_file: Option<PathBuf>,

    /// Service config file path (JSON or TOML); read from the environment when unset
    #[arg(short, long, env = "MLSYS_CONFIG")]
    mlsys_config: Option<PathBuf>,

    /// Disable Swagger UI
    #[arg(long, env = "MLSYS_DISABLE_SWAGGER", default_value_t = false)]
    disable_swagger: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let filter = format!(
        "mlsys_api={level},mlsys={level},tower_http=debug",
        level = cli.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config_file {
        match ApiConfig::load_from_file(config_path) {
            Ok(cfg) => {
                info!("Configuration loaded from: {}", config_path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config file: {}. Using default configuration.",
                    e
                );
                ApiConfig::default()
            }
        }
    } else {
        ApiConfig::default()
    };

    // Override with CLI options
    config.host = cli.host;
    if let Some(port) = cli
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
    {
        config.port = port;
    }
    config.log_level = cli.log_level;
    config.enable_swagger = !cli.disable_swagger;

    let addr = config.socket_addr()?;

    let mlsys_config = match &cli.mlsys_config {
        Some(path) => {
            info!("Service configuration loaded from: {}", path.display());
            MlsysConfig::load_from_file(path)?
        }
        None => MlsysConfig::from_env(),
    };
    if mlsys_config.project_id.is_none() {
        warn!("GCP_PROJECT_ID is not set; catalog writes will fail");
    }

    // Initialize backends and application state
    let app = MlsysApp::from_config(mlsys_config)?;
    let state = AppState::new(&app);

    // Build application
    let router = build_app_with_config(state, &config);

    // Start server
    info!("Starting server on: {}", addr);
    if config.enable_swagger {
        info!("Swagger UI: http://{}/swagger-ui", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
