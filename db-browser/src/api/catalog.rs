//! Schema, table and column listing endpoints

use axum::extract::{Query, State};
use axum::http::StatusCode;

use crate::api::params::{require, require_table};
use crate::api::ApiState;
use crate::database::traits::DatabaseProvider;
use crate::response::ApiResponse;
use crate::schema::{ColumnInfo, TableParams};
use crate::Error;

/// Message for a column lookup that matched nothing
pub const NO_COLUMNS_MESSAGE: &str = "no columns found";

/// Handler for GET /schemas
///
/// Returns every schema name, alphabetical.
pub async fn list_schemas_handler<DB: DatabaseProvider>(
    State(state): State<ApiState<DB>>,
) -> Result<ApiResponse<Vec<String>>, Error> {
    let schemas = state
        .run("list schemas", state.database.list_schemas())
        .await?;
    Ok(ApiResponse::success(schemas))
}

/// Handler for GET /tables?schema=
///
/// Returns the table names within `schema`, alphabetical.
pub async fn list_tables_handler<DB: DatabaseProvider>(
    State(state): State<ApiState<DB>>,
    Query(params): Query<TableParams>,
) -> Result<ApiResponse<Vec<String>>, Error> {
    let schema = require(params.schema.as_deref(), "schema")?;

    let tables = state
        .run("list tables", state.database.list_tables(&schema))
        .await?;
    Ok(ApiResponse::success(tables))
}

/// Handler for GET /columns?schema=&table=
///
/// Returns column descriptors in physical order. A table that matches no columns
/// answers with the "no columns found" envelope (status 204, no data).
pub async fn list_columns_handler<DB: DatabaseProvider>(
    State(state): State<ApiState<DB>>,
    Query(params): Query<TableParams>,
) -> Result<ApiResponse<Vec<ColumnInfo>>, Error> {
    let table = require_table(&params)?;

    let columns = state
        .run("list columns", state.database.list_columns(&table))
        .await?;

    if columns.is_empty() {
        return Ok(ApiResponse {
            status: StatusCode::NO_CONTENT.as_u16(),
            message: NO_COLUMNS_MESSAGE.to_string(),
            data: None,
        });
    }

    Ok(ApiResponse::success(columns))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{call, MockProvider};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_schemas() {
        let (status, body) = call(MockProvider::default(), Method::GET, "/schemas", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": 200, "message": "success", "data": ["information_schema", "public"]})
        );
    }

    #[tokio::test]
    async fn test_catalog_is_stable_across_calls() {
        let provider = MockProvider::default();
        let first = call(provider.clone(), Method::GET, "/columns?schema=public&table=users", None).await;
        let second = call(provider, Method::GET, "/columns?schema=public&table=users", None).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_list_tables_requires_schema() {
        let provider = MockProvider::default();
        let (status, body) = call(provider.clone(), Method::GET, "/tables", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"status": 400, "message": "schema is required"}));
        assert!(provider.calls().is_empty());

        let (status, body) = call(provider, Method::GET, "/tables?schema=public", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!(["orders", "users"]));
    }

    #[tokio::test]
    async fn test_list_columns() {
        let (status, body) = call(
            MockProvider::default(),
            Method::GET,
            "/columns?schema=public&table=users",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["column_name"], "id");
        assert_eq!(body["data"][0]["is_primary_key"], true);
        assert_eq!(body["data"][1]["is_nullable"], true);
    }

    #[tokio::test]
    async fn test_list_columns_no_match() {
        let (status, body) = call(
            MockProvider::default(),
            Method::GET,
            "/columns?schema=public&table=missing",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": 204, "message": "no columns found"}));
    }

    #[tokio::test]
    async fn test_list_columns_requires_table() {
        let (status, body) = call(
            MockProvider::default(),
            Method::GET,
            "/columns?schema=public",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "table is required");
    }

    #[tokio::test]
    async fn test_database_failure_is_conflict() {
        let provider = MockProvider::failing("permission denied for schema secret");
        let (status, body) = call(provider, Method::GET, "/tables?schema=secret", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body,
            json!({"status": 409, "message": "permission denied for schema secret"})
        );
    }
}
