//! REST API endpoints
//!
//! This module contains all API endpoint handlers and the state they share.

use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::Error;

pub mod catalog;
pub mod health;
pub mod params;
pub mod query;
pub mod rows;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export handlers for convenience
pub use catalog::{list_columns_handler, list_schemas_handler, list_tables_handler};
pub use health::health_handler;
pub use query::execute_query_handler;
pub use rows::{
    delete_row_handler, export_rows_handler, insert_row_handler, list_rows_handler,
    update_row_handler,
};

/// Default bound on a single request's database work
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// State shared by all handlers
pub struct ApiState<DB: DatabaseProvider> {
    pub database: Arc<DB>,

    /// Bound on each provider call; export streaming is not bounded once it starts
    pub request_timeout: Duration,

    /// Bearer token required by the raw query endpoint, when set
    pub query_token: Option<Arc<str>>,
}

impl<DB: DatabaseProvider> Clone for ApiState<DB> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            request_timeout: self.request_timeout,
            query_token: self.query_token.clone(),
        }
    }
}

impl<DB: DatabaseProvider> ApiState<DB> {
    pub fn new(database: Arc<DB>) -> Self {
        Self {
            database,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            query_token: None,
        }
    }

    /// Run one provider call under the request timeout
    ///
    /// On expiry the call is dropped, which releases its pooled connection.
    /// Failures are logged here so every handler reports them the same way.
    pub async fn run<T, F>(&self, operation: &str, call: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, DatabaseError>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => {
                tracing::warn!(operation, %error, "database operation failed");
                Err(Error::Database(error))
            }
            Err(_) => {
                tracing::warn!(operation, timeout = ?self.request_timeout, "database operation timed out");
                Err(Error::Timeout(self.request_timeout))
            }
        }
    }
}

/// Create the API router with all endpoints
///
/// # Arguments
///
/// * `state` - Shared handler state wrapping the database provider
///
/// # Returns
///
/// An Axum Router configured with all API routes
pub fn create_api_router<DB: DatabaseProvider>(state: ApiState<DB>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/schemas", get(list_schemas_handler::<DB>))
        .route("/tables", get(list_tables_handler::<DB>))
        .route("/columns", get(list_columns_handler::<DB>))
        .route(
            "/rows",
            get(list_rows_handler::<DB>)
                .post(insert_row_handler::<DB>)
                .patch(update_row_handler::<DB>)
                .delete(delete_row_handler::<DB>),
        )
        .route("/rows/export", get(export_rows_handler::<DB>))
        .route("/query", post(execute_query_handler::<DB>))
        .with_state(state)
}
