//! SQL identifier quoting
//!
//! Schema, table and column names arrive from the caller at request time. They are
//! only ever placed into statement text through [`quote_identifier`], never through
//! plain string formatting.

use serde::Deserialize;

use crate::database::traits::DatabaseError;

/// Quote an identifier (schema, table or column name) for use in statement text
///
/// The name is wrapped in double quotes and every embedded double quote is doubled,
/// so the result is always a single delimited identifier. Names that cannot be
/// represented safely are rejected instead of producing malformed SQL.
///
/// # Errors
///
/// Returns [`DatabaseError::InvalidIdentifier`] for empty names and names that
/// contain a NUL character.
pub fn quote_identifier(identifier: &str) -> Result<String, DatabaseError> {
    if identifier.is_empty() {
        return Err(DatabaseError::InvalidIdentifier(
            "identifier must not be empty".to_string(),
        ));
    }

    if identifier.contains('\0') {
        return Err(DatabaseError::InvalidIdentifier(format!(
            "identifier {:?} contains a NUL character",
            identifier
        )));
    }

    Ok(format!("\"{}\"", identifier.replace('"', "\"\"")))
}

/// Addressing pair for every row and column operation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Schema-qualified, quoted name: `"schema"."table"`
    pub fn qualified(&self) -> Result<String, DatabaseError> {
        Ok(format!(
            "{}.{}",
            quote_identifier(&self.schema)?,
            quote_identifier(&self.table)?
        ))
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}.{}", self.schema, self.table)
    }
}
