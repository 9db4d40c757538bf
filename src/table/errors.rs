//! Table store errors
//!
//! "Not found" is never an error: lookups return `Ok(None)`. Everything here
//! is a real failure: bad input, an undecodable stored record, or an engine
//! fault.

use thiserror::Error;

use crate::engine::EngineError;
use crate::keys::KeyError;
use crate::record::CodecError;

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

/// Table store failures
#[derive(Debug, Error)]
pub enum TableError {
    /// Table name or key failed validation, or a key could not be derived
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Record could not be encoded with the active codec
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Stored bytes under `key` do not decode with the active codec
    #[error("Stored record '{key}' cannot be decoded: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: CodecError,
    },

    /// Merge attempted on a record that is not a field mapping
    #[error("Record '{0}' is not a field mapping and cannot be merged")]
    NotMergeable(String),

    /// Merge patch is not a field mapping
    #[error("Patch must be a mapping of field names to values")]
    InvalidPatch,

    /// Underlying engine failure
    #[error("{0}")]
    Engine(#[from] EngineError),
}

impl TableError {
    /// Whether the failure was caused by the caller's input rather than by
    /// stored data or the engine.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            TableError::Key(KeyError::MissingField(_)) => false,
            TableError::Key(_) => true,
            TableError::NotMergeable(_) | TableError::InvalidPatch => true,
            TableError::Codec(_) | TableError::Corrupt { .. } | TableError::Engine(_) => false,
        }
    }
}
