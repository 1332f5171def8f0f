pub mod error;
pub mod gcs;
pub mod local;
pub mod memory;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use gcs::GcsObjectStore;
pub use local::LocalObjectStore;
pub use memory::InMemoryObjectStore;
pub use traits::{BlobInfo, ObjectStore, StorageConfig};
