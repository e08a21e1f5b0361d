//! In-memory provider and request helpers for handler tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::api::{create_api_router, ApiState};
use crate::database::export::CsvSink;
use crate::database::identifier::TableRef;
use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::schema::{ColumnInfo, Row};

/// Canned catalog: `public.users (id, name)` with three rows and an empty
/// `public.orders`
#[derive(Clone, Default)]
pub struct MockProvider {
    failure: Option<String>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Every operation fails with `message`, as the engine would report it
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Every operation sleeps for `delay` first
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Operations that reached the provider, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: String) -> Result<(), DatabaseError> {
        self.calls.lock().unwrap().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(DatabaseError::Query(message.clone())),
            None => Ok(()),
        }
    }

    fn rows(table: &TableRef) -> Vec<Row> {
        if table.schema != "public" || table.table != "users" {
            return Vec::new();
        }

        [
            json!({"id": 1, "name": "Alice"}),
            json!({"id": 2, "name": null}),
            json!({"id": 3, "name": "Smith, Bob"}),
        ]
        .into_iter()
        .filter_map(|row| match row {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect()
    }

    fn columns(table: &TableRef) -> Vec<ColumnInfo> {
        if table.schema != "public" || table.table != "users" {
            return Vec::new();
        }

        vec![
            ColumnInfo {
                name: "id".to_string(),
                data_type: "integer".to_string(),
                is_nullable: false,
                default_expression: None,
                is_primary_key: true,
            },
            ColumnInfo {
                name: "name".to_string(),
                data_type: "text".to_string(),
                is_nullable: true,
                default_expression: None,
                is_primary_key: false,
            },
        ]
    }
}

#[async_trait]
impl DatabaseProvider for MockProvider {
    async fn list_schemas(&self) -> Result<Vec<String>, DatabaseError> {
        self.enter("list_schemas".to_string()).await?;
        Ok(vec!["information_schema".to_string(), "public".to_string()])
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, DatabaseError> {
        self.enter(format!("list_tables {}", schema)).await?;
        if schema == "public" {
            Ok(vec!["orders".to_string(), "users".to_string()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn list_columns(&self, table: &TableRef) -> Result<Vec<ColumnInfo>, DatabaseError> {
        self.enter(format!("list_columns {}", table)).await?;
        Ok(Self::columns(table))
    }

    async fn list_rows(
        &self,
        table: &TableRef,
        page: u64,
        limit: u64,
    ) -> Result<Vec<Row>, DatabaseError> {
        self.enter(format!("list_rows {} {} {}", table, page, limit))
            .await?;
        let offset = ((page - 1) * limit) as usize;
        Ok(Self::rows(table)
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect())
    }

    async fn insert_row(&self, table: &TableRef, row: Row) -> Result<Row, DatabaseError> {
        self.enter(format!("insert_row {}", table)).await?;
        Ok(row)
    }

    async fn update_row(
        &self,
        table: &TableRef,
        primary_key_column: &str,
        primary_key_value: Value,
        row: Row,
    ) -> Result<Row, DatabaseError> {
        self.enter(format!(
            "update_row {} {}={}",
            table, primary_key_column, primary_key_value
        ))
        .await?;

        let stored = Self::rows(table)
            .into_iter()
            .find(|stored| stored.get(primary_key_column) == Some(&primary_key_value));

        match stored {
            Some(mut stored) => {
                stored.extend(row);
                Ok(stored)
            }
            None => Ok(row),
        }
    }

    async fn delete_row(
        &self,
        table: &TableRef,
        primary_key_column: &str,
        primary_key_value: Value,
    ) -> Result<(), DatabaseError> {
        self.enter(format!(
            "delete_row {} {}={}",
            table, primary_key_column, primary_key_value
        ))
        .await
    }

    async fn export_rows(&self, table: &TableRef, sink: &mut CsvSink) -> Result<(), DatabaseError> {
        self.enter(format!("export_rows {}", table)).await?;

        let columns = Self::columns(table);
        sink.write_header(columns.iter().map(|column| column.name.as_str()))
            .await?;
        for row in Self::rows(table) {
            sink.write_row(row.values()).await?;
        }
        Ok(())
    }

    async fn execute_query(&self, sql: &str) -> Result<(), DatabaseError> {
        self.enter(format!("execute_query {}", sql)).await
    }
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn respond(
    state: ApiState<MockProvider>,
    request: Request<Body>,
) -> (StatusCode, HeaderMap, String) {
    let response = create_api_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Send a prepared request and parse the envelope
pub async fn send(state: ApiState<MockProvider>, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = respond(state, request).await;
    (status, serde_json::from_str(&body).unwrap())
}

/// Send a request with an optional JSON body and parse the envelope
pub async fn call(
    provider: MockProvider,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send(ApiState::new(Arc::new(provider)), request(method, uri, body)).await
}

/// Send a body-less request under a custom request timeout
pub async fn call_with_timeout(
    provider: MockProvider,
    timeout: Duration,
    method: Method,
    uri: &str,
) -> (StatusCode, Value) {
    let mut state = ApiState::new(Arc::new(provider));
    state.request_timeout = timeout;
    send(state, request(method, uri, None)).await
}

/// Send a body-less request and return the raw response text
pub async fn call_raw(
    provider: MockProvider,
    method: Method,
    uri: &str,
) -> (StatusCode, HeaderMap, String) {
    respond(ApiState::new(Arc::new(provider)), request(method, uri, None)).await
}
