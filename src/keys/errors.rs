//! Key encoding errors

use thiserror::Error;

/// Result type for key operations
pub type KeyResult<T> = Result<T, KeyError>;

/// Errors raised while building, deriving or decoding table keys
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Table name is empty or contains a reserved character
    #[error("Invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: String },

    /// Key component contains a reserved character
    #[error("Invalid key component '{component}': {reason}")]
    InvalidComponent { component: String, reason: String },

    /// Key value is not a scalar or a list of scalars
    #[error("Unsupported key value: {0}")]
    UnsupportedValue(String),

    /// Field identifier is neither a name nor a non-negative index
    #[error("Unsupported field identifier: {0}")]
    UnsupportedFieldId(String),

    /// Primary key field is missing from the record
    #[error("Record has no field {0}")]
    MissingField(String),

    /// A record key was required but none was given
    #[error("No key given and no primary key specification to derive one")]
    MissingKey,

    /// Separator character cannot be used
    #[error("Invalid key separator {0:?}")]
    InvalidSeparator(char),

    /// Stored key bytes are not valid UTF-8
    #[error("Stored key is not valid UTF-8: {0}")]
    NotUtf8(String),
}
