//! Dynamic statement construction
//!
//! Builds the parameterized statements behind the row operations for a table named
//! at request time. Identifiers go through [`quote_identifier`]; every value becomes
//! a numbered placeholder (`$1`, `$2`, ...) with its [`BindValue`] collected in
//! order. Statement text never contains a caller-supplied value.
//!
//! Caller values are bound as one-key JSON documents and read back through the
//! table's row type, `(jsonb_populate_record(NULL::<table>, $n))."<column>"`, so the
//! database converts each one with the target column's declared type, length and
//! precision. Rows come back rendered by the database as JSON objects
//! (`row_to_json`), in column order.

use serde_json::Value;

use crate::database::codec::BindValue;
use crate::database::identifier::{quote_identifier, TableRef};
use crate::database::traits::DatabaseError;
use crate::schema::Row;

/// Statement text plus the values to bind, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub parameters: Vec<BindValue>,
}

/// Collects bound values and hands out matching placeholders
struct Parameters {
    /// Quoted table name, doubling as its row type
    row_type: String,
    values: Vec<BindValue>,
}

impl Parameters {
    fn new(table: &TableRef) -> Result<Self, DatabaseError> {
        Ok(Self {
            row_type: table.qualified()?,
            values: Vec::new(),
        })
    }

    /// Bind `value` and return the expression that reads it as `column`'s type
    fn field(&mut self, column: &str, value: &Value) -> Result<String, DatabaseError> {
        let quoted = quote_identifier(column)?;
        self.values.push(BindValue::field(column, value));

        Ok(format!(
            "(jsonb_populate_record(NULL::{}, ${})).{}",
            self.row_type,
            self.values.len(),
            quoted
        ))
    }
}

/// One page of rows: `SELECT * FROM <table> LIMIT $1 OFFSET $2`, each row as JSON
///
/// # Errors
///
/// [`DatabaseError::InvalidArgument`] when `page` or `limit` is zero or the offset
/// does not fit a signed 64-bit integer.
pub fn select_page(table: &TableRef, page: u64, limit: u64) -> Result<Statement, DatabaseError> {
    if page < 1 {
        return Err(DatabaseError::InvalidArgument(
            "page must be at least 1".to_string(),
        ));
    }
    if limit < 1 {
        return Err(DatabaseError::InvalidArgument(
            "limit must be at least 1".to_string(),
        ));
    }

    let out_of_range =
        || DatabaseError::InvalidArgument("page and limit are out of range".to_string());
    let offset = (page - 1).checked_mul(limit).ok_or_else(out_of_range)?;
    let limit = i64::try_from(limit).map_err(|_| out_of_range())?;
    let offset = i64::try_from(offset).map_err(|_| out_of_range())?;

    Ok(Statement {
        sql: format!(
            "SELECT row_to_json(listed.*) FROM (SELECT * FROM {} LIMIT $1 OFFSET $2) AS listed",
            table.qualified()?
        ),
        parameters: vec![BindValue::Integer(limit), BindValue::Integer(offset)],
    })
}

/// Every row of the table as JSON, for export
pub fn select_all(table: &TableRef) -> Result<String, DatabaseError> {
    Ok(format!(
        "SELECT row_to_json(exported.*) FROM {} AS exported",
        table.qualified()?
    ))
}

/// `INSERT INTO <table> (<columns>) VALUES (...)` returning the stored row as JSON
///
/// Columns follow the order of `row`. An empty row is not rejected here; the
/// database reports the empty column list.
pub fn insert(table: &TableRef, row: &Row) -> Result<Statement, DatabaseError> {
    let mut parameters = Parameters::new(table)?;
    let mut columns = Vec::with_capacity(row.len());
    let mut fields = Vec::with_capacity(row.len());

    for (column, value) in row {
        columns.push(quote_identifier(column)?);
        fields.push(parameters.field(column, value)?);
    }

    Ok(Statement {
        sql: format!(
            "INSERT INTO {} AS target ({}) VALUES ({}) RETURNING row_to_json(target.*)",
            parameters.row_type,
            columns.join(", "),
            fields.join(", ")
        ),
        parameters: parameters.values,
    })
}

/// `UPDATE <table> SET <column> = ..., ... WHERE <key> = ...` returning the row as JSON
///
/// The key value is bound last.
pub fn update(
    table: &TableRef,
    primary_key_column: &str,
    primary_key_value: &Value,
    row: &Row,
) -> Result<Statement, DatabaseError> {
    let mut parameters = Parameters::new(table)?;
    let mut assignments = Vec::with_capacity(row.len());

    for (column, value) in row {
        let quoted = quote_identifier(column)?;
        let field = parameters.field(column, value)?;
        assignments.push(format!("{} = {}", quoted, field));
    }

    let predicate = key_predicate(&mut parameters, primary_key_column, primary_key_value)?;

    Ok(Statement {
        sql: format!(
            "UPDATE {} AS target SET {} WHERE {} RETURNING row_to_json(target.*)",
            parameters.row_type,
            assignments.join(", "),
            predicate
        ),
        parameters: parameters.values,
    })
}

/// `DELETE FROM <table> WHERE <key> = ...`
pub fn delete(
    table: &TableRef,
    primary_key_column: &str,
    primary_key_value: &Value,
) -> Result<Statement, DatabaseError> {
    let mut parameters = Parameters::new(table)?;
    let predicate = key_predicate(&mut parameters, primary_key_column, primary_key_value)?;

    Ok(Statement {
        sql: format!("DELETE FROM {} WHERE {}", parameters.row_type, predicate),
        parameters: parameters.values,
    })
}

fn key_predicate(
    parameters: &mut Parameters,
    column: &str,
    value: &Value,
) -> Result<String, DatabaseError> {
    let quoted = quote_identifier(column)?;
    let field = parameters.field(column, value)?;
    Ok(format!("{} = {}", quoted, field))
}
