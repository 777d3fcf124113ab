//! Semantic property values
//!
//! Devices report three shapes of value: integer codes, booleans, and
//! string-encoded JSON blobs. Everything else coming off the wire is
//! normalized into one of these at the transport boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A single property value as stored by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Normalize a raw transport value
    ///
    /// Numbers become `Int` (floats are truncated — device codes are whole
    /// numbers), booleans become `Bool`, strings become `Str`. Structured
    /// JSON (arrays, objects) is kept in its string encoding, matching how
    /// the device itself delivers blob properties.
    pub fn from_json(raw: &JsonValue) -> Option<Self> {
        match raw {
            JsonValue::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(Value::Int),
            JsonValue::Bool(b) => Some(Value::Bool(*b)),
            JsonValue::String(s) => Some(Value::Str(s.clone())),
            JsonValue::Null => None,
            other => Some(Value::Str(other.to_string())),
        }
    }

    /// Convert back to raw JSON for the transport
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Int(i) => JsonValue::from(*i),
            Value::Bool(b) => JsonValue::from(*b),
            Value::Str(s) => JsonValue::from(s.clone()),
        }
    }

    /// Integer view; booleans coerce to 0/1, numeric strings parse
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Str(s) => s.trim().parse().ok(),
        }
    }

    /// Boolean view; integers coerce through `!= 0`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}
