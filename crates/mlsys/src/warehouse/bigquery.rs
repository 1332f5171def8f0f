use async_trait::async_trait;
use chrono::DateTime;
use mlsys_core::{DataType, Field, Table, Value};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::time::Duration;
use tracing::debug;

use super::traits::BIGQUERY_ENDPOINT;
use super::{RowInsertError, TableId, Warehouse, WarehouseError, WarehouseResult, WriteMode};
use crate::gcp::GcpAuth;

/// BigQuery backend speaking the v2 REST API
#[derive(Debug, Clone)]
pub struct BigQueryWarehouse {
    client: reqwest::Client,
    auth: GcpAuth,
    endpoint: String,
    project_id: String,
    location: Option<String>,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SchemaField {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableSchema {
    #[serde(default)]
    fields: Vec<SchemaField>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    v: JsonValue,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    f: Vec<TableCell>,
}

/// Shared shape of `jobs.query` and `jobs.getQueryResults` responses
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    job_reference: Option<JobReference>,
    #[serde(default)]
    job_complete: bool,
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<TableRow>,
    page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    state: String,
    error_result: Option<JsonValue>,
    #[serde(default)]
    errors: Vec<JsonValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Job {
    job_reference: JobReference,
    status: JobStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertAllResponse {
    #[serde(default)]
    insert_errors: Vec<RowInsertError>,
}

impl BigQueryWarehouse {
    pub fn new(client: reqwest::Client, auth: GcpAuth, project_id: impl Into<String>) -> Self {
        Self {
            client,
            auth,
            endpoint: BIGQUERY_ENDPOINT.to_string(),
            project_id: project_id.into(),
            location: None,
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    fn url(&self, segments: &[&str]) -> WarehouseResult<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| {
            WarehouseError::Other(format!("Invalid endpoint {}: {}", self.endpoint, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| WarehouseError::Other(format!("Invalid endpoint {}", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turn a non-2xx response into the backend's error message
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        serde_json::from_str::<JsonValue>(&body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .map(|message| format!("{}: {}", status, message))
            .unwrap_or_else(|| format!("{}: {}", status, body))
    }

    async fn get_query_results(
        &self,
        job: &JobReference,
        page_token: Option<&str>,
    ) -> WarehouseResult<QueryResponse> {
        let url = self.url(&["bigquery", "v2", "projects", &self.project_id, "queries", &job.job_id])?;
        let mut request = self
            .client
            .get(url)
            .bearer_auth(self.auth.token().await?)
            .query(&[("timeoutMs", "10000")]);
        if let Some(location) = job.location.as_deref().or(self.location.as_deref()) {
            request = request.query(&[("location", location)]);
        }
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(WarehouseError::Query(Self::error_message(response).await));
        }
        Ok(response.json().await?)
    }

    async fn wait_for_job(&self, job: &JobReference) -> WarehouseResult<Job> {
        let url = self.url(&["bigquery", "v2", "projects", &self.project_id, "jobs", &job.job_id])?;
        loop {
            let mut request = self.client.get(url.clone()).bearer_auth(self.auth.token().await?);
            if let Some(location) = job.location.as_deref().or(self.location.as_deref()) {
                request = request.query(&[("location", location)]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(WarehouseError::Load(Self::error_message(response).await));
            }
            let current: Job = response.json().await?;
            if current.status.state == "DONE" {
                return Ok(current);
            }

            debug!("Job {} is {}", job.job_id, current.status.state);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn data_type(field: &SchemaField) -> DataType {
    if field.mode.as_deref() == Some("REPEATED") {
        return DataType::String;
    }
    match field.field_type.as_str() {
        "INTEGER" | "INT64" => DataType::Int64,
        "FLOAT" | "FLOAT64" | "NUMERIC" | "BIGNUMERIC" => DataType::Float64,
        "BOOLEAN" | "BOOL" => DataType::Bool,
        "TIMESTAMP" => DataType::Timestamp,
        _ => DataType::String,
    }
}

/// Table field for a result column.
///
/// Scalar types without a `DataType` of their own (DATE, DATETIME, TIME,
/// NUMERIC, BYTES, ...) keep their BigQuery type so a load can declare it
/// again. Repeated and RECORD columns arrive as their JSON text and are
/// written back as STRING; appending them to a table that declares them
/// nested or repeated is rejected by BigQuery.
fn table_field(field: &SchemaField) -> Field {
    let result = Field::new(field.name.clone(), data_type(field));
    let exact = matches!(
        field.field_type.as_str(),
        "STRING" | "INTEGER" | "INT64" | "FLOAT" | "FLOAT64" | "BOOLEAN" | "BOOL" | "TIMESTAMP"
    );
    let nested = field.mode.as_deref() == Some("REPEATED")
        || matches!(field.field_type.as_str(), "RECORD" | "STRUCT");
    if exact || nested {
        result
    } else {
        result.with_source_type(field.field_type.clone())
    }
}

fn parse_cell(value: JsonValue, field: &Field) -> WarehouseResult<Value> {
    let text = match value {
        JsonValue::Null => return Ok(Value::Null),
        JsonValue::String(text) => text,
        other => return Ok(Value::String(other.to_string())),
    };

    let invalid = |e: &dyn std::fmt::Display| {
        WarehouseError::Schema(format!("column {}: {:?}: {}", field.name, text, e))
    };
    let value = match field.data_type {
        DataType::String => Value::String(text.clone()),
        DataType::Int64 => Value::Int(text.parse().map_err(|e| invalid(&e))?),
        DataType::Float64 => Value::Float(text.parse().map_err(|e| invalid(&e))?),
        DataType::Bool => Value::Bool(text.eq_ignore_ascii_case("true")),
        DataType::Timestamp => {
            let seconds: f64 = text.parse().map_err(|e| invalid(&e))?;
            let micros = (seconds * 1_000_000.0).round() as i64;
            let ts = DateTime::from_timestamp_micros(micros)
                .ok_or_else(|| invalid(&"timestamp out of range"))?;
            Value::Timestamp(ts)
        }
    };
    Ok(value)
}

fn decode_rows(fields: &[Field], rows: Vec<TableRow>, table: &mut Table) -> WarehouseResult<()> {
    for row in rows {
        if row.f.len() != fields.len() {
            return Err(WarehouseError::Schema(format!(
                "expected {} cells, got {}",
                fields.len(),
                row.f.len()
            )));
        }
        let values = row
            .f
            .into_iter()
            .zip(fields)
            .map(|(cell, field)| parse_cell(cell.v, field))
            .collect::<WarehouseResult<Vec<_>>>()?;
        table
            .push_row(values)
            .map_err(|e| WarehouseError::Schema(e.to_string()))?;
    }
    Ok(())
}

fn to_ndjson(table: &Table) -> WarehouseResult<Vec<u8>> {
    let mut body = Vec::new();
    for row in table.to_json_rows() {
        serde_json::to_writer(&mut body, &row)
            .map_err(|e| WarehouseError::Load(format!("Failed to encode row: {}", e)))?;
        body.push(b'\n');
    }
    Ok(body)
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    async fn query(&self, sql: &str) -> WarehouseResult<Table> {
        let url = self.url(&["bigquery", "v2", "projects", &self.project_id, "queries"])?;
        let mut body = json!({
            "query": sql,
            "useLegacySql": false,
            "timeoutMs": 10000,
        });
        if let Some(location) = &self.location {
            body["location"] = json!(location);
        }

        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth.token().await?)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(WarehouseError::Query(Self::error_message(response).await));
        }
        let mut page: QueryResponse = response.json().await?;

        let job = page
            .job_reference
            .take()
            .ok_or_else(|| WarehouseError::Query("response carries no job reference".to_string()))?;

        while !page.job_complete {
            debug!("Waiting for query job {}", job.job_id);
            page = self.get_query_results(&job, None).await?;
        }

        let fields: Vec<Field> = page
            .schema
            .as_ref()
            .map(|schema| {
                schema
                    .fields
                    .iter()
                    .map(table_field)
                    .collect()
            })
            .unwrap_or_default();
        let mut table = Table::empty(fields.clone());

        loop {
            let rows = std::mem::take(&mut page.rows);
            decode_rows(&fields, rows, &mut table)?;
            match page.page_token.take() {
                Some(token) => page = self.get_query_results(&job, Some(&token)).await?,
                None => break,
            }
        }

        Ok(table)
    }

    async fn load(&self, table: &Table, destination: &str, mode: WriteMode) -> WarehouseResult<()> {
        let target = TableId::parse(destination, Some(&self.project_id))?;
        let url = self.url(&["upload", "bigquery", "v2", "projects", &self.project_id, "jobs"])?;

        let schema: Vec<JsonValue> = table
            .fields()
            .iter()
            .map(|f| json!({ "name": f.name, "type": f.declared_type() }))
            .collect();
        let mut job_reference = json!({ "projectId": self.project_id });
        if let Some(location) = &self.location {
            job_reference["location"] = json!(location);
        }
        let job = json!({
            "jobReference": job_reference,
            "configuration": {
                "load": {
                    "destinationTable": {
                        "projectId": target.project,
                        "datasetId": target.dataset,
                        "tableId": target.table,
                    },
                    "sourceFormat": "NEWLINE_DELIMITED_JSON",
                    "writeDisposition": mode.as_ref(),
                    "schema": { "fields": schema },
                }
            }
        });

        let boundary = format!("mlsys-{}", uuid::Uuid::new_v4().simple());
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{job}\r\n--{b}\r\nContent-Type: application/octet-stream\r\n\r\n",
                b = boundary,
                job = job
            )
            .as_bytes(),
        );
        body.extend_from_slice(&to_ndjson(table)?);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

        debug!("Starting load job into {} ({} rows, {})", target, table.num_rows(), mode);
        let response = self
            .client
            .post(url)
            .query(&[("uploadType", "multipart")])
            .bearer_auth(self.auth.token().await?)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(WarehouseError::Load(Self::error_message(response).await));
        }

        let started: Job = response.json().await?;
        let finished = self.wait_for_job(&started.job_reference).await?;
        if let Some(error) = finished.status.error_result {
            return Err(WarehouseError::Load(format!(
                "{} (errors: {})",
                error,
                JsonValue::Array(finished.status.errors)
            )));
        }
        Ok(())
    }

    async fn insert_rows(
        &self,
        table_id: &str,
        rows: Vec<JsonValue>,
    ) -> WarehouseResult<Vec<RowInsertError>> {
        let target = TableId::parse(table_id, Some(&self.project_id))?;
        let url = self.url(&[
            "bigquery",
            "v2",
            "projects",
            &target.project,
            "datasets",
            &target.dataset,
            "tables",
            &target.table,
            "insertAll",
        ])?;
        let rows: Vec<JsonValue> = rows.into_iter().map(|row| json!({ "json": row })).collect();

        let response = self
            .client
            .post(url)
            .bearer_auth(self.auth.token().await?)
            .json(&json!({ "rows": rows }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(WarehouseError::Http(Self::error_message(response).await));
        }
        let result: InsertAllResponse = response.json().await?;
        Ok(result.insert_errors)
    }
}
