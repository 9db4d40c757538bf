//! Query-string transport adapter
//!
//! Turns `?method=...&table_name=...&key=a&key=b` style pairs into the same
//! envelope a JSON body would carry. Only a fixed set of parameter names is
//! recognised; anything else is dropped.

use serde_json::{Map, Value};

use super::response::JSONRPC_VERSION;

/// Single-valued parameters (first occurrence wins)
pub const SCALAR_PARAMETERS: [&str; 4] = ["file_path", "limit", "row_data", "table_name"];

/// Repeatable parameters, collected into a list in order
pub const ARRAY_PARAMETERS: [&str; 5] = ["column_list", "end_key", "key", "pk", "start_key"];

/// Builds a request envelope from query pairs.
///
/// `method` and `id` are lifted into the envelope. `row_data` is taken as
/// JSON text when it parses, otherwise as a plain string.
pub fn envelope_from_query<K, V>(pairs: &[(K, V)]) -> Value
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let first = |name: &str| {
        pairs
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_ref())
    };

    let mut envelope = Map::new();
    envelope.insert("jsonrpc".to_string(), Value::from(JSONRPC_VERSION));
    if let Some(method) = first("method") {
        envelope.insert("method".to_string(), Value::from(method));
    }
    if let Some(id) = first("id") {
        envelope.insert("id".to_string(), Value::from(id));
    }

    let mut params = Map::new();
    for name in SCALAR_PARAMETERS {
        if let Some(value) = first(name) {
            let value = if name == "row_data" {
                serde_json::from_str(value).unwrap_or_else(|_| Value::from(value))
            } else {
                Value::from(value)
            };
            params.insert(name.to_string(), value);
        }
    }
    for name in ARRAY_PARAMETERS {
        let values: Vec<Value> = pairs
            .iter()
            .filter(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| Value::from(v.as_ref()))
            .collect();
        if !values.is_empty() {
            params.insert(name.to_string(), Value::Array(values));
        }
    }
    envelope.insert("params".to_string(), Value::Object(params));

    Value::Object(envelope)
}
