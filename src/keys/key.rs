//! Key, field identifier and primary key specification types

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::errors::{KeyError, KeyResult};

/// A record key within one table.
///
/// Components are always text; scalar JSON values are coerced to their
/// textual form before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// No key: addresses the bare table prefix (scan boundary only)
    Absent,
    /// One component
    Single(String),
    /// Several components, compared left to right
    Composite(Vec<String>),
}

impl Key {
    /// Single-component key
    pub fn single(component: impl Into<String>) -> Self {
        Key::Single(component.into())
    }

    /// Multi-component key
    pub fn composite<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Key::Composite(components.into_iter().map(Into::into).collect())
    }

    /// The empty key: lowest key of any table
    pub fn lowest() -> Self {
        Key::Single(String::new())
    }

    /// Build a key from a JSON value.
    ///
    /// - string, number, bool: one component
    /// - array of scalars: one component per element
    /// - null or empty array: absent
    pub fn from_value(value: &Value) -> KeyResult<Self> {
        match value {
            Value::Null => Ok(Key::Absent),
            Value::Array(items) if items.is_empty() => Ok(Key::Absent),
            Value::Array(items) => items
                .iter()
                .map(scalar_text)
                .collect::<KeyResult<Vec<_>>>()
                .map(Key::Composite),
            other => scalar_text(other).map(Key::Single),
        }
    }

    /// Components in order
    pub fn components(&self) -> &[String] {
        match self {
            Key::Absent => &[],
            Key::Single(c) => std::slice::from_ref(c),
            Key::Composite(cs) => cs,
        }
    }

    /// Whether this is the absent key
    pub fn is_absent(&self) -> bool {
        matches!(self, Key::Absent)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::single(s)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Single(s)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Absent => serializer.serialize_none(),
            Key::Single(component) => serializer.serialize_str(component),
            Key::Composite(components) => components.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Key::from_value(&value).map_err(D::Error::custom)
    }
}

/// Text form of a scalar key component
fn scalar_text(value: &Value) -> KeyResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(KeyError::UnsupportedValue(other.to_string())),
    }
}

/// Identifies one field of a record: by name in a mapping, by position in a
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldId {
    Name(String),
    Index(usize),
}

impl FieldId {
    /// Build from a JSON string or non-negative integer
    pub fn from_value(value: &Value) -> KeyResult<Self> {
        match value {
            Value::String(s) => Ok(FieldId::Name(s.clone())),
            Value::Number(n) => n
                .as_u64()
                .map(|i| FieldId::Index(i as usize))
                .ok_or_else(|| KeyError::UnsupportedFieldId(n.to_string())),
            other => Err(KeyError::UnsupportedFieldId(other.to_string())),
        }
    }

    /// Looks the field up in `record`.
    ///
    /// Mappings are addressed by name (an index is looked up by its decimal
    /// text); sequences only by an in-bounds index.
    pub fn lookup<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        match (self, record) {
            (FieldId::Name(name), Value::Object(map)) => map.get(name),
            (FieldId::Index(i), Value::Object(map)) => map.get(&i.to_string()),
            (FieldId::Index(i), Value::Array(items)) => items.get(*i),
            _ => None,
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldId::Name(name) => write!(f, "{}", name),
            FieldId::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for FieldId {
    fn from(s: &str) -> Self {
        FieldId::Name(s.to_string())
    }
}

impl From<usize> for FieldId {
    fn from(i: usize) -> Self {
        FieldId::Index(i)
    }
}

impl Serialize for FieldId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldId::Name(name) => serializer.serialize_str(name),
            FieldId::Index(i) => serializer.serialize_u64(*i as u64),
        }
    }
}

impl<'de> Deserialize<'de> for FieldId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FieldId::from_value(&value).map_err(D::Error::custom)
    }
}

/// How the key of a written record is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryKey {
    /// Caller supplies the key
    Explicit(Key),
    /// Key is the value of one record field
    Field(FieldId),
    /// Key is the values of several record fields, in order
    Fields(Vec<FieldId>),
}

impl PrimaryKey {
    /// Build a derivation spec from a JSON field id or list of field ids
    pub fn from_spec(value: &Value) -> KeyResult<Self> {
        match value {
            Value::Array(ids) => ids
                .iter()
                .map(FieldId::from_value)
                .collect::<KeyResult<Vec<_>>>()
                .map(PrimaryKey::Fields),
            other => FieldId::from_value(other).map(PrimaryKey::Field),
        }
    }

    /// Resolves the key for `record`.
    ///
    /// A key without components would encode to the bare table prefix, which
    /// lies outside the table's range, so it is `MissingKey`.
    pub fn resolve(&self, record: &Value) -> KeyResult<Key> {
        let key = match self {
            PrimaryKey::Explicit(key) => key.clone(),
            PrimaryKey::Field(id) => Key::Single(field_value(id, record)?),
            PrimaryKey::Fields(ids) => Key::Composite(
                ids.iter()
                    .map(|id| field_value(id, record))
                    .collect::<KeyResult<Vec<_>>>()?,
            ),
        };
        if key.components().is_empty() {
            return Err(KeyError::MissingKey);
        }
        Ok(key)
    }
}

/// Serializes as the wire form: an explicit key as-is, a derivation spec
/// as its field id or list of field ids.
impl Serialize for PrimaryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PrimaryKey::Explicit(key) => key.serialize(serializer),
            PrimaryKey::Field(id) => id.serialize(serializer),
            PrimaryKey::Fields(ids) => ids.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PrimaryKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        PrimaryKey::from_spec(&value).map_err(D::Error::custom)
    }
}

fn field_value(id: &FieldId, record: &Value) -> KeyResult<String> {
    let value = id
        .lookup(record)
        .ok_or_else(|| KeyError::MissingField(id.to_string()))?;
    scalar_text(value)
}
