//! # db-browser
//!
//! A generic HTTP API for browsing and editing the tables of a relational database,
//! integrable into any Axum application as a router.
//!
//! ## Features
//!
//! - Schema, table and column discovery from the catalog
//! - Paginated row listing for any table named at request time
//! - Single-row insert, update and delete keyed by a caller-chosen column
//! - Streaming CSV export of whole tables
//! - Raw SQL execution, optionally gated by a bearer token
//! - PostgreSQL support
//!
//! Every value supplied by the caller is bound as a statement parameter. Schema,
//! table and column names are quoted as identifiers and rejected when they cannot
//! be quoted safely.
//!
//! ## Security Warning
//!
//! - No authentication for the browsing and editing endpoints
//! - Exposes full database schema and data
//! - Raw query execution allows full database access unless a query token is set
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::Router;
//! use db_browser::DbBrowserLayer;
//! use sqlx::PgPool;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = PgPool::connect("postgres://localhost/app")
//!         .await
//!         .unwrap();
//!
//!     let app: Router = DbBrowserLayer::postgres("/db", pool)
//!         .with_query_token(Some("secret".to_string()))
//!         .into_router();
//!
//!     // Serve the application...
//! }
//! ```

// Public modules
pub mod api;
pub mod database;
pub mod layer;
pub mod response;
pub mod schema;

// Public exports
pub use layer::DbBrowserLayer;
pub use response::ApiResponse;
pub use schema::{ColumnInfo, Row};

// Re-export database providers
pub use database::traits::{DatabaseError, DatabaseProvider};
pub use database::{DriverKind, TableRef};

#[cfg(feature = "postgres")]
pub use database::postgres::PostgresProvider;

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced at the HTTP boundary
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid request parameter
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// No driver exists for the configured engine
    #[error("unsupported database type: {0}")]
    UnsupportedDriver(String),

    #[error("missing or invalid query token")]
    Unauthorized,

    #[error("request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
