//! Canonical text codec

use serde_json::Value;

use super::errors::{CodecError, CodecResult};
use super::RecordCodec;

/// Stores records as compact JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl RecordCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, record: &Value) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(record).map_err(|e| CodecError::Text(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> CodecResult<Value> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Text(e.to_string()))
    }
}
