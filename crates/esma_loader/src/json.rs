//! JSON search responses to records.

use esma_common::{FlatRecord, RecordSet};
use serde_json::Value;

use crate::error::LoaderError;

/// Decodes a JSON response body.
pub fn parse_body(body: &[u8], url: &str) -> Result<Value, LoaderError> {
    serde_json::from_slice(body).map_err(|e| LoaderError::Json {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// The array at `pointer` (RFC 6901), e.g. `/response/docs`.
pub fn array_at<'a>(value: &'a Value, pointer: &str, url: &str) -> Result<&'a [Value], LoaderError> {
    value
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| LoaderError::Json {
            url: url.to_string(),
            reason: format!("no array at {pointer}"),
        })
}

/// One record per JSON object, fields sorted by name.
///
/// Strings are kept verbatim, `null` becomes a null cell and any other value
/// is stored as its JSON text.
pub fn records_from_objects<'a>(
    objects: impl IntoIterator<Item = &'a Value>,
    url: &str,
) -> Result<RecordSet, LoaderError> {
    objects
        .into_iter()
        .map(|value| {
            let object = value.as_object().ok_or_else(|| LoaderError::Json {
                url: url.to_string(),
                reason: format!("expected an object, found {}", kind(value)),
            })?;
            Ok(object
                .iter()
                .map(|(name, field)| (name.as_str(), cell(field)))
                .collect::<FlatRecord>())
        })
        .collect()
}

fn cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
