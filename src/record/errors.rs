//! Record codec errors

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Record encode/decode failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Canonical text could not be produced or parsed
    #[error("Text codec error: {0}")]
    Text(String),

    /// Binary payload could not be produced or parsed
    #[error("Binary codec error: {0}")]
    Binary(String),

    /// Unknown codec name in configuration
    #[error("Unknown record codec '{0}'")]
    UnknownCodec(String),
}
