//! CLI command handlers

pub mod event;
pub mod predict;
pub mod registry;
pub mod upload;

pub use event::{read_event, run_register_event};
pub use predict::run_predict;
pub use registry::run_registry;
pub use upload::run_upload;
