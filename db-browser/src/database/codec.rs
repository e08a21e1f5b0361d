//! Value codec
//!
//! Write path: JSON values supplied by the caller become [`BindValue`]s that a
//! driver binds as statement parameters. Values are never rendered into statement
//! text. Each caller value travels as a one-key JSON document naming its column,
//! so the database parses it with that column's own input rules.
//!
//! Read path: the database renders each row as a JSON object (see the provider
//! modules); this module turns those JSON values into CSV fields.

use serde_json::Value;

use crate::schema::Row;

/// A value bound as a statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    /// Structural integers such as `LIMIT` and `OFFSET`
    Integer(i64),
    /// One caller value keyed by its column: `{"<column>": <value>}`
    Field(Row),
}

impl BindValue {
    pub fn field(column: &str, value: &Value) -> Self {
        let mut document = Row::new();
        document.insert(column.to_string(), value.clone());
        BindValue::Field(document)
    }
}

/// Canonical text of a decoded value for CSV export (NULL → empty string)
pub fn value_to_csv_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(boolean) => boolean.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Append one CSV record, quoting fields per RFC 4180, terminated by `\n`
pub fn write_csv_record<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for (index, field) in fields.into_iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        csv_escape_into(out, field.as_ref());
    }
    out.push('\n');
}

/// Quote a field if it contains `,` `"` or a line break
fn csv_escape_into(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}
