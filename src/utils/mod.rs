use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;
use sha2::{Digest, Sha256};

const SHORT_HASH_LEN: usize = 12;

/// First 12 hex characters of the SHA-256 of `input`. Stable across runs, so
/// it is used wherever an id must be derived from content.
pub fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    let mut hex = format!("{:x}", result);
    hex.truncate(SHORT_HASH_LEN);
    hex
}

/// JSON truthiness: null, false, zero, and empty strings or containers are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Numbers arrive as JSON numbers or as strings such as "19.99".
pub fn lenient_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// `deserialize_with` for an optional number that may be sent as a string.
pub fn deserialize_lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    lenient_f64(&value)
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("expected a number, got {}", value)))
}

/// `deserialize_with` for optional text that may be sent as a bare number or bool.
pub fn deserialize_lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!("expected a string, got {}", other))),
    }
}

/// `deserialize_with` for whole-number scores written as 85, 85.0 or "85".
pub fn deserialize_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let score = lenient_f64(&value)
        .ok_or_else(|| D::Error::custom(format!("expected a score, got {}", value)))?;
    if score < 0.0 || score.fract() != 0.0 || score > u32::MAX as f64 {
        return Err(D::Error::custom(format!("score {} is not a whole non-negative number", score)));
    }
    Ok(score as u32)
}
