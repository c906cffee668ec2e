//! Avro value → JSON text conversion.
//!
//! Used by the decode step to turn a natively decoded Avro value into the
//! human-readable form handed to message handlers. Unions are unwrapped to
//! their branch value and bytes and fixed values are base64 encoded. Logical
//! types are rendered as their underlying number or string, except durations,
//! which become a `{"months", "days", "millis"}` object. Non-finite floats are
//! written as the strings `"NaN"`, `"Infinity"` and `"-Infinity"`.

use apache_avro::types::Value;
use base64::Engine;

/// Convert an Avro value into a JSON value.
pub fn avro_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::json!(i),
        Value::Long(l) => serde_json::json!(l),
        Value::Float(f) if f.is_finite() => serde_json::json!(f),
        Value::Float(f) => non_finite(f64::from(*f)),
        Value::Double(d) if d.is_finite() => serde_json::json!(d),
        Value::Double(d) => non_finite(*d),
        Value::Bytes(b) | Value::Fixed(_, b) => serde_json::Value::String(encode_base64(b)),
        Value::String(s) | Value::Enum(_, s) => serde_json::Value::String(s.clone()),
        Value::Union(_, inner) => avro_to_json(inner),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(avro_to_json).collect()),
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), avro_to_json(v)))
                .collect(),
        ),
        Value::Record(fields) => serde_json::Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), avro_to_json(v)))
                .collect(),
        ),
        Value::Date(d) => serde_json::json!(d),
        Value::TimeMillis(t) => serde_json::json!(t),
        Value::TimeMicros(t) => serde_json::json!(t),
        Value::TimestampMillis(t) => serde_json::json!(t),
        Value::TimestampMicros(t) => serde_json::json!(t),
        Value::TimestampNanos(t) => serde_json::json!(t),
        Value::LocalTimestampMillis(t) => serde_json::json!(t),
        Value::LocalTimestampMicros(t) => serde_json::json!(t),
        Value::LocalTimestampNanos(t) => serde_json::json!(t),
        Value::Decimal(d) => {
            let unscaled: Vec<u8> = d.try_into().unwrap_or_default();
            serde_json::Value::String(encode_base64(&unscaled))
        }
        Value::BigDecimal(d) => serde_json::Value::String(d.to_string()),
        Value::Uuid(u) => serde_json::Value::String(u.to_string()),
        Value::Duration(d) => serde_json::json!({
            "months": u32::from(d.months()),
            "days": u32::from(d.days()),
            "millis": u32::from(d.millis()),
        }),
    }
}

fn non_finite(f: f64) -> serde_json::Value {
    let text = if f.is_nan() {
        "NaN"
    } else if f.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    };
    serde_json::Value::String(text.to_string())
}

/// Render an Avro value as compact JSON text.
pub fn avro_to_text(value: &Value) -> String {
    avro_to_json(value).to_string()
}

fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
