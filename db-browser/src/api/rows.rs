//! Row endpoints: paginated listing, single-row mutations and CSV export

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::stream::{self, StreamExt};

use crate::api::params::{json_body, require, require_positive, require_table, require_value};
use crate::api::ApiState;
use crate::database::export::{body_stream, CsvSink};
use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::response::ApiResponse;
use crate::schema::{DeleteRowRequest, Row, TableParams, UpdateRowRequest};
use crate::Error;

/// Chunks buffered between the database cursor and a slow client
const EXPORT_CHANNEL_CAPACITY: usize = 16;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Handler for GET /rows?schema=&table=&page=&limit=
///
/// Returns at most `limit` rows starting at `(page - 1) * limit`. Parameters are
/// checked in the order schema, table, page, limit.
pub async fn list_rows_handler<DB: DatabaseProvider>(
    State(state): State<ApiState<DB>>,
    Query(params): Query<TableParams>,
) -> Result<ApiResponse<Vec<Row>>, Error> {
    let table = require_table(&params)?;
    let page = require_positive(params.page.as_deref(), "page")?;
    let limit = require_positive(params.limit.as_deref(), "limit")?;

    let rows = state
        .run("list rows", state.database.list_rows(&table, page, limit))
        .await?;
    Ok(ApiResponse::success(rows))
}

/// Handler for POST /rows?schema=&table=
///
/// The body is the row to insert, as a JSON object of column name to value. The
/// response carries the row as stored.
pub async fn insert_row_handler<DB: DatabaseProvider>(
    State(state): State<ApiState<DB>>,
    Query(params): Query<TableParams>,
    body: Result<Json<Row>, JsonRejection>,
) -> Result<ApiResponse<Row>, Error> {
    let table = require_table(&params)?;
    let row = json_body(body)?;

    let inserted = state
        .run("insert row", state.database.insert_row(&table, row))
        .await?;
    Ok(ApiResponse::success(inserted))
}

/// Handler for PATCH /rows?schema=&table=
///
/// Request body:
/// ```json
/// {"pk_column": "id", "pk_value": 5, "data": {"name": "Alice"}}
/// ```
pub async fn update_row_handler<DB: DatabaseProvider>(
    State(state): State<ApiState<DB>>,
    Query(params): Query<TableParams>,
    body: Result<Json<UpdateRowRequest>, JsonRejection>,
) -> Result<ApiResponse<Row>, Error> {
    let table = require_table(&params)?;
    let request = json_body(body)?;
    let pk_column = require(Some(request.pk_column.as_str()), "pk_column")?;
    let pk_value = require_value(request.pk_value, "pk_value")?;

    let updated = state
        .run(
            "update row",
            state
                .database
                .update_row(&table, &pk_column, pk_value, request.data),
        )
        .await?;
    Ok(ApiResponse::success(updated))
}

/// Handler for DELETE /rows?schema=&table=
///
/// Succeeds whether or not a row matched.
pub async fn delete_row_handler<DB: DatabaseProvider>(
    State(state): State<ApiState<DB>>,
    Query(params): Query<TableParams>,
    body: Result<Json<DeleteRowRequest>, JsonRejection>,
) -> Result<ApiResponse, Error> {
    let table = require_table(&params)?;
    let request = json_body(body)?;
    let pk_column = require(Some(request.pk_column.as_str()), "pk_column")?;
    let pk_value = require_value(request.pk_value, "pk_value")?;

    state
        .run(
            "delete row",
            state.database.delete_row(&table, &pk_column, pk_value),
        )
        .await?;
    Ok(ApiResponse::ok())
}

/// Handler for GET /rows/export?schema=&table=
///
/// Streams the whole table as CSV. The export runs on its own task and feeds the
/// response body through a bounded channel.
///
/// Response headers are only committed once the header record has been produced,
/// so failures before any output still answer with an error envelope. A failure
/// after that ends the body early.
pub async fn export_rows_handler<DB: DatabaseProvider>(
    State(state): State<ApiState<DB>>,
    Query(params): Query<TableParams>,
) -> Result<Response, Error> {
    let table = require_table(&params)?;
    table.qualified()?;

    let (mut sink, mut receiver) = CsvSink::channel(EXPORT_CHANNEL_CAPACITY);
    let database = state.database.clone();
    let export_table = table.clone();

    let export = tokio::spawn(async move {
        let result = database.export_rows(&export_table, &mut sink).await;
        match &result {
            Ok(()) => {}
            Err(DatabaseError::ExportClosed) => {
                tracing::debug!(table = %export_table, "export abandoned by client");
            }
            Err(error) => {
                tracing::error!(table = %export_table, %error, "export failed");
            }
        }

        let records = sink.finish(result).await;
        tracing::debug!(table = %export_table, records, "export finished");
    });

    let first = match tokio::time::timeout(state.request_timeout, receiver.recv()).await {
        Ok(Some(Ok(chunk))) => chunk,
        Ok(Some(Err(error))) => return Err(Error::Database(error)),
        Ok(None) => {
            return Err(Error::Database(DatabaseError::Query(
                "export ended before producing output".to_string(),
            )))
        }
        Err(_) => {
            export.abort();
            tracing::warn!(%table, timeout = ?state.request_timeout, "export timed out");
            return Err(Error::Timeout(state.request_timeout));
        }
    };

    let body = stream::once(async move { Ok::<_, DatabaseError>(first) })
        .chain(body_stream(receiver));

    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, export_disposition()),
        ],
        Body::from_stream(body),
    )
        .into_response())
}

/// `attachment; filename="export_<UTC timestamp>.csv"`
fn export_disposition() -> String {
    format!(
        "attachment; filename=\"export_{}.csv\"",
        chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S-%3f")
    )
}
