//! Liveness endpoint

use axum::http::StatusCode;

use crate::response::ApiResponse;

/// Handler for GET /health
///
/// Answers without touching the database.
pub async fn health_handler() -> ApiResponse {
    ApiResponse::message(StatusCode::OK, "pong")
}
