//! Record post-processing
//!
//! Applied to every fetched record before emission: the parent id is
//! injected for child streams and numeric fields that arrive as strings
//! are converted.

use super::StreamDescriptor;
use crate::types::{Context, JsonValue};
use serde_json::Number;

/// Post-process one record for `stream`
pub fn post_process(
    stream: &StreamDescriptor,
    mut record: JsonValue,
    context: Option<&Context>,
) -> JsonValue {
    let Some(fields) = record.as_object_mut() else {
        return record;
    };

    if let (Some(parent), Some(context)) = (stream.parent, context) {
        if let Some(id) = context.get(parent.key) {
            fields.insert(parent.key.to_string(), id.clone());
        }
    }

    for &name in stream.numeric_fields {
        if let Some(value) = fields.get_mut(name) {
            *value = coerce_number(value);
        }
    }

    record
}

/// Convert a numeric-looking value to a JSON number.
///
/// Numbers and nulls pass through; strings are parsed as integers, then
/// as floats. Anything that cannot be converted becomes `null`.
pub fn coerce_number(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Number(_) | JsonValue::Null => value.clone(),
        JsonValue::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return JsonValue::Number(i.into());
            }
            s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map_or(JsonValue::Null, JsonValue::Number)
        }
        _ => JsonValue::Null,
    }
}
