use std::fmt;

use crate::error::CoreError;
use crate::value::Value;

/// The unique identifier linking a materialized row to its source entity (or,
/// for pure dimensions, a natural key such as a calendar date).
///
/// Only scalar kinds make valid keys: text, integer, float (decimal),
/// timestamp, date, time. Booleans, nulls, and anything reference-shaped are
/// rejected at construction so a misconfigured schema fails loudly instead of
/// silently keying every row on the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKey(Value);

impl RecordKey {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Stable msgpack encoding, used as the key blob in storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        self.0
            .to_msgpack()
            .map_err(|e| CoreError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let value =
            Value::from_msgpack(bytes).map_err(|e| CoreError::Serialization(e.to_string()))?;
        Self::try_from(value)
    }
}

impl TryFrom<Value> for RecordKey {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Text(_)
            | Value::Integer(_)
            | Value::Float(_)
            | Value::Timestamp(_)
            | Value::Date(_)
            | Value::Time(_) => Ok(Self(value)),
            Value::Null => Err(CoreError::InvalidKey("null is not a valid key".into())),
            Value::Boolean(_) => Err(CoreError::InvalidKey("boolean is not a valid key".into())),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(n: i64) -> Self {
        Self(Value::Integer(n))
    }
}

impl From<&str> for RecordKey {
    fn from(s: &str) -> Self {
        Self(Value::Text(s.to_string()))
    }
}

impl From<time::Date> for RecordKey {
    fn from(d: time::Date) -> Self {
        Self(Value::Date(d))
    }
}

impl From<time::Time> for RecordKey {
    fn from(t: time::Time) -> Self {
        Self(Value::Time(t))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Timestamp(ts) => write!(f, "{ts}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{t}"),
            other => write!(f, "{other:?}"),
        }
    }
}
