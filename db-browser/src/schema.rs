//! Wire types for catalog results and request bodies
//!
//! These types represent database shape discovered at runtime and the JSON bodies
//! accepted by the row endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single row: column name to JSON scalar, in column order
///
/// Key order is preserved both for rows read from the database (result set order)
/// and for rows supplied by the caller (body order).
pub type Row = serde_json::Map<String, Value>;

/// Information about a single column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    #[serde(rename = "column_name")]
    pub name: String,

    /// SQL data type as reported by the catalog (e.g. "integer", "character varying")
    pub data_type: String,

    /// Whether the column allows NULL values
    pub is_nullable: bool,

    /// Default value expression (if any)
    #[serde(rename = "column_default")]
    pub default_expression: Option<String>,

    /// Whether this column is part of the primary key
    pub is_primary_key: bool,
}

/// Query string shared by every table-scoped endpoint
///
/// All fields are optional so that missing parameters produce an envelope with a
/// `"<name> is required"` message instead of an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableParams {
    pub schema: Option<String>,
    pub table: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Body for PATCH /rows
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRowRequest {
    #[serde(default)]
    pub pk_column: String,

    #[serde(default)]
    pub pk_value: Value,

    #[serde(default)]
    pub data: Row,
}

/// Body for DELETE /rows
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRowRequest {
    #[serde(default)]
    pub pk_column: String,

    #[serde(default)]
    pub pk_value: Value,
}

/// Request to execute a raw SQL statement
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}
