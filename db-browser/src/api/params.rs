//! Required-parameter checks shared by the handlers
//!
//! Every check fails with [`Error::Validation`] before any database call.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::Value;

use crate::database::TableRef;
use crate::schema::TableParams;
use crate::Error;

/// A non-empty string parameter
pub fn require(value: Option<&str>, name: &str) -> Result<String, Error> {
    match value {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(Error::Validation(format!("{} is required", name))),
    }
}

/// A positive integer parameter
///
/// Missing or empty values are "required"; anything that is not an integer of at
/// least 1 is rejected as non-positive.
pub fn require_positive(value: Option<&str>, name: &str) -> Result<u64, Error> {
    let value = require(value, name)?;

    match value.trim().parse::<u64>() {
        Ok(number) if number >= 1 => Ok(number),
        _ => Err(Error::Validation(format!(
            "{} must be a positive integer",
            name
        ))),
    }
}

/// The `schema` and `table` pair, checked in that order
pub fn require_table(params: &TableParams) -> Result<TableRef, Error> {
    let schema = require(params.schema.as_deref(), "schema")?;
    let table = require(params.table.as_deref(), "table")?;
    Ok(TableRef::new(schema, table))
}

/// A primary-key predicate value: present and not null
pub fn require_value(value: Value, name: &str) -> Result<Value, Error> {
    if value.is_null() {
        return Err(Error::Validation(format!("{} is required", name)));
    }
    Ok(value)
}

/// Unwrap a JSON body, turning parse failures into validation errors
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    body.map(|Json(value)| value)
        .map_err(|rejection| Error::Validation(rejection.body_text()))
}
