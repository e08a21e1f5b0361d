//! DbBrowserLayer - Main Axum integration layer
//!
//! This module provides the main entry point for mounting the database browser API
//! into an Axum application.

use crate::api::{create_api_router, ApiState};
use crate::database::traits::DatabaseProvider;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

#[cfg(feature = "postgres")]
use crate::database::postgres::PostgresProvider;

/// Main layer for integrating the database browser into an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use axum::Router;
/// use db_browser::DbBrowserLayer;
/// use sqlx::PgPool;
///
/// # async fn example() {
/// let pool = PgPool::connect("postgres://localhost/app").await.unwrap();
/// let browser = DbBrowserLayer::postgres("/db", pool);
/// let app = Router::new().merge(browser.into_router());
/// # }
/// ```
pub struct DbBrowserLayer<DB: DatabaseProvider> {
    base_path: String,
    state: ApiState<DB>,
}

impl<DB: DatabaseProvider> DbBrowserLayer<DB> {
    /// Create a new browser API at the given base path
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path the endpoints are mounted under (e.g., "/db");
    ///   empty or "/" mounts them at the root
    /// * `database` - The database provider implementation
    pub fn new(base_path: impl Into<String>, database: DB) -> Self {
        Self {
            base_path: base_path.into(),
            state: ApiState::new(Arc::new(database)),
        }
    }

    /// Bound each request's database work
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.state.request_timeout = timeout;
        self
    }

    /// Require `Authorization: Bearer <token>` on the raw query endpoint
    ///
    /// `None` or an empty token leaves the endpoint open.
    pub fn with_query_token(mut self, token: Option<String>) -> Self {
        self.state.query_token = token
            .filter(|token| !token.is_empty())
            .map(Arc::from);
        self
    }

    /// Whether the raw query endpoint requires a token
    pub fn query_guarded(&self) -> bool {
        self.state.query_token.is_some()
    }

    /// Convert into an Axum Router that can be merged
    ///
    /// This method consumes the layer and returns a Router that can be merged
    /// into your main application router. Permissive CORS is applied to the
    /// browser endpoints.
    pub fn into_router(self) -> Router {
        let api_router = create_api_router(self.state);

        // Axum cannot nest at the root path
        let base_path = self.base_path.trim_end_matches('/');
        let router = if base_path.is_empty() {
            api_router
        } else if base_path.starts_with('/') {
            Router::new().nest(base_path, api_router)
        } else {
            Router::new().nest(&format!("/{}", base_path), api_router)
        };

        router.layer(CorsLayer::permissive())
    }
}

#[cfg(feature = "postgres")]
impl DbBrowserLayer<PostgresProvider> {
    /// Create a new browser API for PostgreSQL
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path the endpoints are mounted under
    /// * `pool` - The PostgreSQL connection pool
    pub fn postgres(base_path: impl Into<String>, pool: sqlx::PgPool) -> Self {
        Self::new(base_path, PostgresProvider::new(pool))
    }
}
