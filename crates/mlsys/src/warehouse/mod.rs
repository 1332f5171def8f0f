pub mod bigquery;
pub mod error;
pub mod memory;
pub mod traits;

pub use bigquery::BigQueryWarehouse;
pub use error::{WarehouseError, WarehouseResult};
pub use memory::InMemoryWarehouse;
pub use traits::{RowInsertError, TableId, Warehouse, WarehouseConfig, WriteMode};
