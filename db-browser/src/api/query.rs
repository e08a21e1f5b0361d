//! Raw SQL query execution endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use subtle::ConstantTimeEq;

use crate::api::params::{json_body, require};
use crate::api::ApiState;
use crate::database::traits::DatabaseProvider;
use crate::response::ApiResponse;
use crate::schema::QueryRequest;
use crate::Error;

/// Handler for POST /query
///
/// Executes a raw SQL statement and echoes its text back on success.
///
/// # Security Warning
///
/// This endpoint allows executing ANY SQL statement, DDL and multiple statements
/// included. When a query token is configured the request must carry
/// `Authorization: Bearer <token>`; without one the endpoint is open to every
/// client that can reach the browsing endpoints.
///
/// Request body:
/// ```json
/// {
///   "query": "UPDATE users SET active = false WHERE last_login < now() - interval '1 year'"
/// }
/// ```
pub async fn execute_query_handler<DB: DatabaseProvider>(
    State(state): State<ApiState<DB>>,
    headers: HeaderMap,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<ApiResponse<String>, Error> {
    authorize(state.query_token.as_deref(), &headers)?;

    let request = json_body(body)?;
    require(Some(request.query.trim()), "query")?;

    tracing::debug!(sql = %request.query, "executing raw query");

    state
        .run("execute query", state.database.execute_query(&request.query))
        .await?;
    Ok(ApiResponse::success(request.query))
}

/// Check the bearer token when one is configured
fn authorize(expected: Option<&str>, headers: &HeaderMap) -> Result<(), Error> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let supplied = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default();

    if bool::from(supplied.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{call, send, MockProvider};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    fn guarded_request(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/query")
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder
            .body(Body::from(json!({"query": "SELECT 1"}).to_string()))
            .unwrap()
    }

    fn guarded_state(provider: MockProvider) -> ApiState<MockProvider> {
        let mut state = ApiState::new(Arc::new(provider));
        state.query_token = Some(Arc::from("s3cret"));
        state
    }

    #[tokio::test]
    async fn test_open_endpoint_echoes_query() {
        let provider = MockProvider::default();
        let (status, body) = call(
            provider.clone(),
            Method::POST,
            "/query",
            Some(json!({"query": "CREATE TABLE t (id int); DROP TABLE t"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "CREATE TABLE t (id int); DROP TABLE t");
        assert_eq!(
            provider.calls(),
            vec!["execute_query CREATE TABLE t (id int); DROP TABLE t"]
        );
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let provider = MockProvider::default();
        let (status, body) = call(
            provider.clone(),
            Method::POST,
            "/query",
            Some(json!({"query": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "query is required");
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_query_failure_is_conflict() {
        let (status, body) = call(
            MockProvider::failing("syntax error at or near \"SELCT\""),
            Method::POST,
            "/query",
            Some(json!({"query": "SELCT 1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "syntax error at or near \"SELCT\"");
    }

    #[tokio::test]
    async fn test_token_is_required_when_configured() {
        let provider = MockProvider::default();

        let (status, body) = send(guarded_state(provider.clone()), guarded_request(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);

        let (status, _) =
            send(guarded_state(provider.clone()), guarded_request(Some("wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(provider.calls().is_empty());

        let (status, body) =
            send(guarded_state(provider.clone()), guarded_request(Some("s3cret"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "SELECT 1");
        assert_eq!(provider.calls(), vec!["execute_query SELECT 1"]);
    }

    #[test]
    fn test_authorize_without_token() {
        assert!(authorize(None, &HeaderMap::new()).is_ok());
        assert!(matches!(
            authorize(Some("token"), &HeaderMap::new()),
            Err(Error::Unauthorized)
        ));
    }
}
