//! Table key encoding
//!
//! Maps (table, key) pairs onto the engine's single sorted byte key space so
//! that each table is one contiguous, independently scannable range.

mod codec;
mod errors;
mod key;

pub use codec::{DecodedKey, KeyCodec, DEFAULT_SEPARATOR, UPPER_SENTINEL};
pub use errors::{KeyError, KeyResult};
pub use key::{FieldId, Key, PrimaryKey};
