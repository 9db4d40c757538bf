//! Table key encoding
//!
//! ```text
//! engine key = table SEP component1 SEP component2 ...
//! ```
//!
//! Byte order of encoded keys equals (table, component-by-component) order
//! as long as no table name or component contains SEP. Both are validated
//! here rather than left to callers.
//!
//! Every table occupies `[table SEP, table SEP 0xFF)`. `0xFF` never occurs
//! in UTF-8 text, so no legal key reaches the upper bound and a scan bounded
//! this way can never spill into a neighbouring table.

use serde_json::Value;

use super::errors::{KeyError, KeyResult};
use super::key::{Key, PrimaryKey};

/// Default component separator
pub const DEFAULT_SEPARATOR: char = '.';

/// Byte appended after `table SEP` to form a table's exclusive upper bound
pub const UPPER_SENTINEL: u8 = 0xFF;

/// An engine key split back into its table and key parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedKey {
    /// Owning table
    pub table: String,
    /// Everything after the first separator, as stored
    pub key_text: String,
    /// Key components in order
    pub components: Vec<String>,
}

/// Encodes and decodes table keys with a fixed separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCodec {
    separator: char,
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
        }
    }
}

impl KeyCodec {
    /// Create a codec using `separator` between key parts.
    ///
    /// Control characters are reserved for the dump format and rejected.
    pub fn new(separator: char) -> KeyResult<Self> {
        if separator.is_control() {
            return Err(KeyError::InvalidSeparator(separator));
        }
        Ok(Self { separator })
    }

    /// The component separator
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Checks that `table` can be used as a key prefix.
    pub fn validate_table(&self, table: &str) -> KeyResult<()> {
        let invalid = |reason: String| KeyError::InvalidTableName {
            name: table.to_string(),
            reason,
        };
        if table.is_empty() {
            return Err(invalid("name is empty".to_string()));
        }
        if table.contains(self.separator) {
            return Err(invalid(format!("contains separator {:?}", self.separator)));
        }
        if table.chars().any(char::is_control) {
            return Err(invalid("contains a control character".to_string()));
        }
        Ok(())
    }

    fn validate_component(&self, component: &str) -> KeyResult<()> {
        let invalid = |reason: String| KeyError::InvalidComponent {
            component: component.to_string(),
            reason,
        };
        if component.contains(self.separator) {
            return Err(invalid(format!("contains separator {:?}", self.separator)));
        }
        if component.chars().any(char::is_control) {
            return Err(invalid("contains a control character".to_string()));
        }
        Ok(())
    }

    /// Encodes `table` and `key` into an engine key.
    ///
    /// An absent key yields the bare table prefix.
    pub fn encode(&self, table: &str, key: &Key) -> KeyResult<Vec<u8>> {
        self.validate_table(table)?;

        let mut encoded = String::with_capacity(table.len() + 16);
        encoded.push_str(table);
        for component in key.components() {
            self.validate_component(component)?;
            encoded.push(self.separator);
            encoded.push_str(component);
        }
        Ok(encoded.into_bytes())
    }

    /// Lowest engine key of `table` (the empty key).
    pub fn lower_bound(&self, table: &str) -> KeyResult<Vec<u8>> {
        self.encode(table, &Key::lowest())
    }

    /// Exclusive upper bound of `table`.
    pub fn upper_bound(&self, table: &str) -> KeyResult<Vec<u8>> {
        let mut bound = self.lower_bound(table)?;
        bound.push(UPPER_SENTINEL);
        Ok(bound)
    }

    /// Resolves `pk` against `record` and encodes the result.
    pub fn derive_key(&self, table: &str, pk: &PrimaryKey, record: &Value) -> KeyResult<Vec<u8>> {
        let key = pk.resolve(record)?;
        self.encode(table, &key)
    }

    /// Splits an engine key into table and components.
    pub fn decode(&self, encoded: &[u8]) -> KeyResult<DecodedKey> {
        let text = std::str::from_utf8(encoded)
            .map_err(|_| KeyError::NotUtf8(String::from_utf8_lossy(encoded).into_owned()))?;

        match text.split_once(self.separator) {
            Some((table, rest)) => Ok(DecodedKey {
                table: table.to_string(),
                key_text: rest.to_string(),
                components: rest.split(self.separator).map(str::to_string).collect(),
            }),
            None => Ok(DecodedKey {
                table: text.to_string(),
                key_text: String::new(),
                components: Vec::new(),
            }),
        }
    }
}
