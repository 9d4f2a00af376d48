//! Conversion between plain JSON and Firestore's typed value encoding
//! (`{"stringValue": "..."}`, `{"arrayValue": {"values": [...]}}`, ...).

use crate::error::{firestore_error, AppResult};
use serde_json::{json, Map, Number, Value};

/// Encode a JSON value as a Firestore value
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            if items.is_empty() {
                json!({ "arrayValue": {} })
            } else {
                let values: Vec<Value> = items.iter().map(encode_value).collect();
                json!({ "arrayValue": { "values": values } })
            }
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

/// Encode every field of a document
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Decode a Firestore value into plain JSON.
///
/// Timestamps, references and bytes come back as their string form.
pub fn decode_value(value: &Value) -> AppResult<Value> {
    let object = value
        .as_object()
        .filter(|object| object.len() == 1)
        .ok_or_else(|| firestore_error(&format!("Malformed Firestore value: {}", value)))?;

    // Checked above: exactly one entry
    let Some((kind, inner)) = object.iter().next() else {
        return Err(firestore_error("Empty Firestore value"));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| firestore_error("booleanValue is not a boolean")),
        "integerValue" => decode_integer(inner),
        "doubleValue" => Ok(decode_double(inner)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| firestore_error(&format!("{} is not a string", kind))),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<AppResult<Vec<_>>>()?,
                Some(_) => return Err(firestore_error("arrayValue.values is not an array")),
                None => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => match inner.get("fields") {
            Some(Value::Object(fields)) => Ok(Value::Object(decode_fields(fields)?)),
            Some(_) => Err(firestore_error("mapValue.fields is not an object")),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(firestore_error(&format!("Unsupported Firestore value type: {}", other))),
    }
}

/// Decode every field of a document
pub fn decode_fields(fields: &Map<String, Value>) -> AppResult<Map<String, Value>> {
    fields
        .iter()
        .map(|(key, value)| Ok((key.clone(), decode_value(value)?)))
        .collect()
}

fn decode_integer(inner: &Value) -> AppResult<Value> {
    // The REST API sends int64 as a string
    let parsed = match inner {
        Value::String(s) => s.parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    };
    parsed
        .map(|i| Value::Number(i.into()))
        .ok_or_else(|| firestore_error(&format!("Invalid integerValue: {}", inner)))
}

fn decode_double(inner: &Value) -> Value {
    // NaN and the infinities arrive as strings and have no JSON form
    match inner {
        Value::Number(n) => Value::Number(n.clone()),
        Value::String(s) => s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
