pub mod entry;
pub mod event;
pub mod path;
pub mod scanner;

pub use entry::{CatalogEntry, EventCatalogEntry, StorageEvent, SCAN_UPLOADER, UNKNOWN_UPLOADER};
pub use event::EventRegistrar;
pub use path::{ArtifactRef, ParseSkipReason, model_path, parse_artifact_path};
pub use scanner::{RegistryScanner, ScanReport};
