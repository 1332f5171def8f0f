//! mlsys CLI library

pub mod commands;
pub mod error;

use error::CliError;
use mlsys::{MlsysApp, MlsysConfig};
use std::path::Path;

/// Build the application from a config file, or from the environment when none is given
pub fn load_app(config_path: Option<&Path>) -> Result<MlsysApp, CliError> {
    let config = match config_path {
        Some(path) => MlsysConfig::load_from_file(path)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))?,
        None => MlsysConfig::from_env(),
    };
    Ok(MlsysApp::from_config(config)?)
}
