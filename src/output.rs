use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CliError;

/// Renders a value as JSON indented by two spaces
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(CliError::Format)
}

/// Re-indents a raw response body, keeping key order and number text intact
pub fn format_body(body: &[u8]) -> Result<String, CliError> {
    let value: Value = serde_json::from_slice(body).map_err(CliError::Format)?;
    to_pretty_json(&value)
}

/// Pulls the `Members` array out of a collection response
///
/// The document itself must be a JSON object; a `Members` key that is
/// missing or not an array is reported separately.
pub fn members_of(body: &[u8]) -> Result<Vec<Value>, CliError> {
    let mut document: Map<String, Value> =
        serde_json::from_slice(body).map_err(CliError::Decode)?;

    match document.remove("Members") {
        Some(Value::Array(members)) => Ok(members),
        _ => Err(CliError::MembersNotList),
    }
}
