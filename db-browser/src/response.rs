//! Response envelope
//!
//! Every endpoint answers with `{status, message, data?}`, error paths included.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::database::DatabaseError;
use crate::Error;

/// Message used for successful operations
pub const SUCCESS_MESSAGE: &str = "success";

/// Uniform result wrapper
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T = ()> {
    /// HTTP status code the result stands for
    pub status: u16,

    pub message: String,

    /// Absent on errors and on "no content" results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with a payload
    pub fn success(data: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: SUCCESS_MESSAGE.to_string(),
            data: Some(data),
        }
    }
}

impl ApiResponse {
    /// Envelope without payload
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            data: None,
        }
    }

    /// 200 success marker without payload
    pub fn ok() -> Self {
        Self::message(StatusCode::OK, SUCCESS_MESSAGE)
    }

    /// The "no content" outcome: HTTP 200 carrying an envelope status of 204
    ///
    /// A real 204 response cannot carry a body, and clients read the message.
    pub fn no_content(message: impl Into<String>) -> Self {
        Self::message(StatusCode::NO_CONTENT, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        // The HTTP status follows the envelope, except that a body-less 204 is
        // never emitted.
        let status = StatusCode::from_u16(self.status)
            .ok()
            .filter(|status| *status != StatusCode::NO_CONTENT)
            .unwrap_or(StatusCode::OK);

        (status, Json(self)).into_response()
    }
}

impl Error {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_)
            | Error::Database(DatabaseError::InvalidIdentifier(_))
            | Error::Database(DatabaseError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            Error::Database(DatabaseError::Query(_))
            | Error::Database(DatabaseError::ExportClosed) => StatusCode::CONFLICT,
            Error::UnsupportedDriver(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        ApiResponse::message(self.status_code(), self.to_string()).into_response()
    }
}
