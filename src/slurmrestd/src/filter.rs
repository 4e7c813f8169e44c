//! Top-level field projection

use serde_json::Value;

/// Keep only the allowed top-level keys of a record or of each record of a list
///
/// `None` leaves the value unchanged. Nested objects are not filtered, and
/// values that are neither records nor lists of records pass through.
pub fn filter_fields(value: Value, allow_list: Option<&[String]>) -> Value {
    let Some(allowed) = allow_list else {
        return value;
    };

    match value {
        Value::Object(mut record) => {
            record.retain(|key, _| allowed.iter().any(|field| field == key));
            Value::Object(record)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| filter_fields(item, Some(allowed)))
                .collect(),
        ),
        other => other,
    }
}
