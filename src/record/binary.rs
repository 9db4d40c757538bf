//! Compact binary codec
//!
//! `postcard` is not self-describing, so records are mirrored into a typed
//! enum before encoding instead of serializing `serde_json::Value` directly.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::errors::{CodecError, CodecResult};
use super::RecordCodec;

/// Typed mirror of the JSON value model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Packed {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<Packed>),
    Map(Vec<(String, Packed)>),
}

impl Packed {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Packed::Null,
            Value::Bool(b) => Packed::Bool(*b),
            Value::Number(n) => Self::from_number(n),
            Value::String(s) => Packed::Str(s.clone()),
            Value::Array(items) => Packed::List(items.iter().map(Self::from_value).collect()),
            Value::Object(map) => Packed::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_value(v)))
                    .collect(),
            ),
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            Packed::Int(i)
        } else if let Some(u) = n.as_u64() {
            Packed::UInt(u)
        } else {
            // JSON numbers are always finite
            Packed::Float(n.as_f64().unwrap_or_default())
        }
    }

    fn into_value(self) -> Value {
        match self {
            Packed::Null => Value::Null,
            Packed::Bool(b) => Value::Bool(b),
            Packed::Int(i) => Value::from(i),
            Packed::UInt(u) => Value::from(u),
            Packed::Float(f) => Value::from(f),
            Packed::Str(s) => Value::String(s),
            Packed::List(items) => Value::Array(items.into_iter().map(Self::into_value).collect()),
            Packed::Map(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.into_value()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

/// Stores records in `postcard` binary form.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl RecordCodec for BinaryCodec {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn encode(&self, record: &Value) -> CodecResult<Vec<u8>> {
        postcard::to_allocvec(&Packed::from_value(record))
            .map_err(|e| CodecError::Binary(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<Value> {
        postcard::from_bytes::<Packed>(bytes)
            .map(Packed::into_value)
            .map_err(|e| CodecError::Binary(e.to_string()))
    }
}
