use async_trait::async_trait;
use mlsys_core::Table;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{RowInsertError, Warehouse, WarehouseError, WarehouseResult, WriteMode};

/// In-memory implementation of Warehouse for testing and development.
///
/// Queries are limited to `SELECT * FROM <table>`.
#[derive(Debug, Default)]
pub struct InMemoryWarehouse {
    tables: RwLock<HashMap<String, Table>>,
    inserted: RwLock<HashMap<String, Vec<serde_json::Value>>>,
    insert_calls: RwLock<usize>,
}

fn normalize(id: &str) -> String {
    id.trim().trim_end_matches(';').trim().trim_matches('`').to_string()
}

fn lock_error(e: impl std::fmt::Display) -> WarehouseError {
    WarehouseError::Other(format!("Failed to acquire lock: {}", e))
}

impl InMemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table
    pub fn with_table(self, id: &str, table: Table) -> Self {
        if let Ok(mut tables) = self.tables.write() {
            tables.insert(normalize(id), table);
        }
        self
    }

    /// Current contents of a table
    pub fn table(&self, id: &str) -> Option<Table> {
        self.tables.read().ok()?.get(&normalize(id)).cloned()
    }

    /// Rows received through streaming inserts
    pub fn inserted_rows(&self, id: &str) -> Vec<serde_json::Value> {
        self.inserted
            .read()
            .ok()
            .and_then(|inserted| inserted.get(&normalize(id)).cloned())
            .unwrap_or_default()
    }

    /// Number of streaming insert calls made so far
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.read().map(|n| *n).unwrap_or_default()
    }

    fn parse_select_all(sql: &str) -> WarehouseResult<String> {
        let tokens: Vec<&str> = sql.split_whitespace().collect();
        match tokens.as_slice() {
            [select, "*", from, table]
                if select.eq_ignore_ascii_case("select") && from.eq_ignore_ascii_case("from") =>
            {
                Ok(normalize(table))
            }
            _ => Err(WarehouseError::Query(format!(
                "Unsupported query for in-memory warehouse: {}",
                sql
            ))),
        }
    }
}

#[async_trait]
impl Warehouse for InMemoryWarehouse {
    async fn query(&self, sql: &str) -> WarehouseResult<Table> {
        let id = Self::parse_select_all(sql)?;
        let tables = self.tables.read().map_err(lock_error)?;
        tables
            .get(&id)
            .cloned()
            .ok_or_else(|| WarehouseError::Query(format!("Not found: Table {}", id)))
    }

    async fn load(&self, table: &Table, destination: &str, mode: WriteMode) -> WarehouseResult<()> {
        let id = normalize(destination);
        let mut tables = self.tables.write().map_err(lock_error)?;

        match (mode, tables.get_mut(&id)) {
            (WriteMode::Truncate, _) | (_, None) => {
                tables.insert(id, table.clone());
            }
            (WriteMode::EmptyOnly, Some(existing)) if !existing.is_empty() => {
                return Err(WarehouseError::Load(format!(
                    "Already Exists: Table {} is not empty",
                    id
                )));
            }
            (_, Some(existing)) => {
                if existing.fields() != table.fields() {
                    return Err(WarehouseError::Load(format!(
                        "Provided schema does not match Table {}",
                        id
                    )));
                }
                for row in table.rows() {
                    existing
                        .push_row(row.clone())
                        .map_err(|e| WarehouseError::Load(e.to_string()))?;
                }
            }
        }
        Ok(())
    }

    async fn insert_rows(
        &self,
        table_id: &str,
        rows: Vec<serde_json::Value>,
    ) -> WarehouseResult<Vec<RowInsertError>> {
        *self.insert_calls.write().map_err(lock_error)? += 1;
        let mut inserted = self.inserted.write().map_err(lock_error)?;
        inserted.entry(normalize(table_id)).or_default().extend(rows);
        Ok(Vec::new())
    }
}
