//! Flat key/value records.

use super::error::{QueryError, Result};
use serde_json::Value;

/// A single record: field name to scalar value.
///
/// Insertion order is preserved, so projected records list their fields in
/// the order the query selected them.
pub type Record = serde_json::Map<String, Value>;

/// Convert a JSON value into a record.
///
/// # Errors
///
/// Returns `QueryError::InvalidCollection` if the value is not a JSON object
///
/// # Example
///
/// ```rust
/// use dictql::types::into_record;
/// use serde_json::json;
///
/// let record = into_record(json!({"name": "Adam", "sales": 100})).unwrap();
/// assert_eq!(record["sales"], json!(100));
/// ```
pub fn into_record(value: Value) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(QueryError::InvalidCollection(format!(
            "record must be an object, got {}",
            value_kind(&other)
        ))),
    }
}

/// Type name of a JSON value, as used in error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
