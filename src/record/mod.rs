//! Record payload serialization
//!
//! Exactly one codec is active per store, injected at construction:
//!
//! - `json`: canonical text (compact JSON), human-readable
//! - `binary`: compact `postcard` encoding of the same value model
//!
//! Records are `serde_json::Value`s regardless of codec; dump and load always
//! use the canonical text form so dumps are codec-independent.

mod binary;
mod errors;
mod json;

pub use binary::BinaryCodec;
pub use errors::{CodecError, CodecResult};
pub use json::JsonCodec;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serializes record payloads for storage in the engine.
pub trait RecordCodec: Send + Sync {
    /// Short name used in configuration and diagnostics
    fn name(&self) -> &'static str;

    /// Encodes a record for storage
    fn encode(&self, record: &Value) -> CodecResult<Vec<u8>>;

    /// Decodes a stored record
    fn decode(&self, bytes: &[u8]) -> CodecResult<Value>;
}

/// Codec selection, made once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Json,
    Binary,
}

impl CodecKind {
    /// Instantiates the selected codec
    pub fn build(self) -> Box<dyn RecordCodec> {
        match self {
            CodecKind::Json => Box::new(JsonCodec),
            CodecKind::Binary => Box::new(BinaryCodec),
        }
    }

    /// Configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            CodecKind::Json => "json",
            CodecKind::Binary => "binary",
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CodecKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(CodecKind::Json),
            "binary" => Ok(CodecKind::Binary),
            other => Err(CodecError::UnknownCodec(other.to_string())),
        }
    }
}

/// Canonical text form of a record: compact JSON.
///
/// Never contains raw control characters (they are escaped), so it is safe
/// to embed on a single line next to a control-character separator.
pub fn canonical_text(record: &Value) -> String {
    record.to_string()
}

/// Parses the canonical text form.
pub fn parse_canonical(text: &str) -> CodecResult<Value> {
    serde_json::from_str(text).map_err(|e| CodecError::Text(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_codec_kind_parse() {
        assert_eq!("json".parse::<CodecKind>().unwrap(), CodecKind::Json);
        assert_eq!("binary".parse::<CodecKind>().unwrap(), CodecKind::Binary);
        assert!("msgpack".parse::<CodecKind>().is_err());
    }

    #[test]
    fn test_build_matches_kind() {
        assert_eq!(CodecKind::Json.build().name(), "json");
        assert_eq!(CodecKind::Binary.build().name(), "binary");
    }

    #[test]
    fn test_every_codec_round_trips() {
        let record = json!({
            "name": "Curt",
            "dob": 19560606,
            "balance": -12.5,
            "tags": ["a", null, true],
            "nested": {"big": 18446744073709551615u64, "neg": -3}
        });
        for kind in [CodecKind::Json, CodecKind::Binary] {
            let codec = kind.build();
            let bytes = codec.encode(&record).unwrap();
            assert_eq!(codec.decode(&bytes).unwrap(), record, "codec {}", kind);
        }
    }

    #[test]
    fn test_canonical_text_is_single_line() {
        let record = json!({"note": "line1\nline2\ttabbed"});
        let text = canonical_text(&record);
        assert!(!text.contains('\n'));
        assert!(!text.contains('\t'));
        assert_eq!(parse_canonical(&text).unwrap(), record);
    }
}
