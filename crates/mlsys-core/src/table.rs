//! In-memory tabular data exchanged with the warehouse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use crate::{CoreError, Result};

/// Column type of a table field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    String,
    Int64,
    Float64,
    Bool,
    Timestamp,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::String => write!(f, "STRING"),
            DataType::Int64 => write!(f, "INT64"),
            DataType::Float64 => write!(f, "FLOAT64"),
            DataType::Bool => write!(f, "BOOL"),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    /// Column type as the warehouse declared it, when `data_type` is narrower
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            source_type: None,
        }
    }

    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }

    /// Type to declare when writing this column back to a warehouse
    pub fn declared_type(&self) -> String {
        self.source_type
            .clone()
            .unwrap_or_else(|| self.data_type.to_string())
    }
}

/// A single cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Numeric view of the cell, used for model features
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(v) => JsonValue::Bool(*v),
            Value::Int(v) => JsonValue::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(v) => JsonValue::String(v.clone()),
            Value::Timestamp(v) => JsonValue::String(v.to_rfc3339()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

/// Row-major table with a fixed schema.
///
/// Every row holds exactly one value per field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    fields: Vec<Field>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table, checking that every row matches the schema width
    pub fn new(fields: Vec<Field>, rows: Vec<Vec<Value>>) -> Result<Self> {
        for row in &rows {
            if row.len() != fields.len() {
                return Err(CoreError::ShapeMismatch {
                    expected: fields.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(Self { fields, rows })
    }

    /// Table with a schema and no rows
    pub fn empty(fields: Vec<Field>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// All values of one column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| CoreError::MissingColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.fields.len() {
            return Err(CoreError::ShapeMismatch {
                expected: self.fields.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Copy the named columns forward into a new table, in the given order
    pub fn select(&self, names: &[impl AsRef<str>]) -> Result<Table> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name.as_ref())
                    .ok_or_else(|| CoreError::MissingColumn(name.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let fields = indices.iter().map(|&i| self.fields[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Table { fields, rows })
    }

    /// Append a column; `values` must hold one entry per row
    pub fn with_column(mut self, field: Field, values: Vec<Value>) -> Result<Table> {
        if values.len() != self.rows.len() {
            return Err(CoreError::ShapeMismatch {
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        self.fields.push(field);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(self)
    }

    /// Append a column holding the same value in every row
    pub fn with_constant(self, field: Field, value: Value) -> Result<Table> {
        let values = vec![value; self.rows.len()];
        self.with_column(field, values)
    }

    /// One JSON object per row, keyed by field name
    pub fn to_json_rows(&self) -> Vec<JsonValue> {
        self.rows
            .iter()
            .map(|row| {
                let object: Map<String, JsonValue> = self
                    .fields
                    .iter()
                    .zip(row)
                    .map(|(field, value)| (field.name.clone(), value.to_json()))
                    .collect();
                JsonValue::Object(object)
            })
            .collect()
    }
}
