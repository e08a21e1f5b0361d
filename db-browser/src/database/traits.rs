//! Database provider trait
//!
//! This trait defines the interface that every database driver must provide. A
//! driver is chosen once at start-up; handlers only ever see the trait.

use crate::database::export::CsvSink;
use crate::database::identifier::TableRef;
use crate::schema::{ColumnInfo, Row};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Database provider trait for catalog lookups and dynamic row access
///
/// Every operation is a single independent statement against a single table. No
/// existence checks are performed up front: unknown schemas or tables surface as
/// [`DatabaseError::Query`] from the engine.
#[async_trait]
pub trait DatabaseProvider: Send + Sync + 'static {
    /// List schema names, alphabetical
    async fn list_schemas(&self) -> Result<Vec<String>, DatabaseError>;

    /// List table names within a schema, alphabetical
    async fn list_tables(&self, schema: &str) -> Result<Vec<String>, DatabaseError>;

    /// List column descriptors in physical column order
    ///
    /// An empty vector means the table matched nothing; it is not an error.
    async fn list_columns(&self, table: &TableRef) -> Result<Vec<ColumnInfo>, DatabaseError>;

    /// Fetch one page of rows
    ///
    /// # Arguments
    ///
    /// * `table` - Table to read from
    /// * `page` - 1-based page number
    /// * `limit` - Page size, at least 1
    async fn list_rows(
        &self,
        table: &TableRef,
        page: u64,
        limit: u64,
    ) -> Result<Vec<Row>, DatabaseError>;

    /// Insert a single row and return it as stored
    async fn insert_row(&self, table: &TableRef, row: Row) -> Result<Row, DatabaseError>;

    /// Update the row whose `primary_key_column` equals `primary_key_value`
    ///
    /// Zero matched rows is not an error; the supplied row is echoed back.
    async fn update_row(
        &self,
        table: &TableRef,
        primary_key_column: &str,
        primary_key_value: Value,
        row: Row,
    ) -> Result<Row, DatabaseError>;

    /// Delete the row whose `primary_key_column` equals `primary_key_value`
    ///
    /// Zero matched rows is not an error.
    async fn delete_row(
        &self,
        table: &TableRef,
        primary_key_column: &str,
        primary_key_value: Value,
    ) -> Result<(), DatabaseError>;

    /// Stream the whole table as CSV into `sink`
    ///
    /// The header record is written first, then one record per row as rows arrive
    /// from the database. The caller finishes the sink.
    async fn export_rows(&self, table: &TableRef, sink: &mut CsvSink) -> Result<(), DatabaseError>;

    /// Execute a raw SQL statement
    ///
    /// # Security Warning
    ///
    /// This runs any statement text, unparameterized, including DDL and multiple
    /// statements separated by semicolons. It is a SQL console, not a CRUD
    /// operation.
    async fn execute_query(&self, sql: &str) -> Result<(), DatabaseError>;
}

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A schema, table or column name could not be quoted safely
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A structural argument (page, limit) is out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine rejected or failed the statement
    #[error("{0}")]
    Query(String),

    /// The export consumer stopped reading
    #[error("Export stream closed by client")]
    ExportClosed,
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(database_error) => {
                DatabaseError::Query(database_error.message().to_string())
            }
            other => DatabaseError::Query(other.to_string()),
        }
    }
}
