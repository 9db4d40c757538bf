//! Request envelope and per-method parameters

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::keys::{FieldId, Key, PrimaryKey};
use crate::table::ScanRange;

use super::errors::{RpcError, RpcResult};

/// A validated request envelope
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    /// Correlation id, echoed verbatim (`null` if absent)
    pub id: Value,
    /// Method name as sent
    pub method: String,
    /// Named parameters
    pub params: Map<String, Value>,
}

impl RpcRequest {
    /// Reads the correlation id, if any, from a parsed body.
    ///
    /// Called before validation so that even rejected requests echo it.
    pub fn peek_id(body: &Value) -> Value {
        body.get("id").cloned().unwrap_or(Value::Null)
    }

    /// Validates the envelope of a parsed body.
    ///
    /// `jsonrpc`, `method` and `params` must all be present; `method` must be
    /// a string and `params` a mapping.
    pub fn from_value(body: Value) -> RpcResult<Self> {
        let mut envelope = match body {
            Value::Object(map) => map,
            _ => return Err(RpcError::invalid_request("request must be an object")),
        };

        for field in ["jsonrpc", "method", "params"] {
            if !envelope.contains_key(field) {
                return Err(RpcError::invalid_request(format!("missing '{}'", field)));
            }
        }

        let id = envelope.remove("id").unwrap_or(Value::Null);
        let method = match envelope.remove("method") {
            Some(Value::String(name)) => name,
            _ => return Err(RpcError::method_not_found()),
        };
        let params = match envelope.remove("params") {
            Some(Value::Object(params)) => params,
            _ => return Err(RpcError::invalid_params("params must be an object")),
        };

        Ok(Self { id, method, params })
    }
}

/// Deserializes a method's parameters, rejecting unknown or mistyped ones.
pub fn parse_params<T: DeserializeOwned>(params: Map<String, Value>) -> RpcResult<T> {
    serde_json::from_value(Value::Object(params)).map_err(|e| RpcError::invalid_params(e.to_string()))
}

/// Normalizes `limit` and caps it at `ceiling`.
///
/// `limit` may be a non-negative number or a numeric string. With a ceiling,
/// a larger or missing limit becomes the ceiling.
pub fn clamp_limit(params: &mut Map<String, Value>, ceiling: Option<usize>) -> RpcResult<()> {
    let requested = match params.get("limit") {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_limit(value)?),
    };

    let effective = match (requested, ceiling) {
        (Some(limit), Some(ceiling)) => Some(limit.min(ceiling)),
        (None, ceiling) => ceiling,
        (limit, None) => limit,
    };

    match effective {
        Some(limit) => {
            params.insert("limit".to_string(), Value::from(limit));
        }
        None => {
            params.remove("limit");
        }
    }
    Ok(())
}

fn parse_limit(value: &Value) -> RpcResult<usize> {
    let invalid = || RpcError::invalid_params(format!("limit must be a non-negative integer, got {}", value));
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
            .ok_or_else(invalid),
        Value::String(s) => s.trim().parse::<usize>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// `write`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteParams {
    pub table_name: String,
    #[serde(default)]
    pub pk: Option<PrimaryKey>,
    #[serde(default)]
    pub key: Option<Key>,
    pub row_data: Value,
}

impl WriteParams {
    /// A derivation spec wins over an explicit key
    pub fn primary_key(&self) -> PrimaryKey {
        match (&self.pk, &self.key) {
            (Some(pk), _) => pk.clone(),
            (None, Some(key)) => PrimaryKey::Explicit(key.clone()),
            (None, None) => PrimaryKey::Explicit(Key::Absent),
        }
    }
}

/// `rewrite`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteParams {
    pub table_name: String,
    pub key: Key,
    pub update_data: Value,
}

/// `exists`, `read`, `next`, `delete`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyParams {
    pub table_name: String,
    pub key: Key,
}

/// `first`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FirstParams {
    pub table_name: String,
    #[serde(default)]
    pub key: Option<Key>,
}

/// `readColumns`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadColumnsParams {
    pub table_name: String,
    pub key: Key,
    pub column_list: Vec<FieldId>,
}

/// `getTableKeys`, `getTableRows`, `getTableItems`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanParams {
    pub table_name: String,
    #[serde(default)]
    pub start_key: Option<Key>,
    #[serde(default)]
    pub end_key: Option<Key>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ScanParams {
    pub fn range(&self) -> ScanRange {
        ScanRange {
            start_key: self.start_key.clone(),
            end_key: self.end_key.clone(),
            limit: self.limit,
        }
    }
}

/// `dumpAll`, `load`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileParams {
    #[serde(default)]
    pub file_path: Option<String>,
}

/// `commit`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::errors::RpcErrorCode;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_envelope_requires_fields() {
        let err = RpcRequest::from_value(json!({"jsonrpc": "2.0", "method": "read"})).unwrap_err();
        assert_eq!(err.code(), RpcErrorCode::InvalidRequest);

        let err = RpcRequest::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err.code(), RpcErrorCode::InvalidRequest);

        let req = RpcRequest::from_value(json!({"jsonrpc": "2.0", "method": "read", "params": {}, "id": 3}))
            .unwrap();
        assert_eq!(req.id, json!(3));
        assert_eq!(req.method, "read");
    }

    #[test]
    fn test_envelope_non_object_params() {
        let err = RpcRequest::from_value(json!({"jsonrpc": "2.0", "method": "read", "params": [1]}))
            .unwrap_err();
        assert_eq!(err.code(), RpcErrorCode::InvalidParams);
    }

    #[test]
    fn test_clamp_caps_and_injects() {
        let mut p = params(json!({"limit": 100000}));
        clamp_limit(&mut p, Some(500)).unwrap();
        assert_eq!(p["limit"], json!(500));

        let mut p = params(json!({"limit": 10}));
        clamp_limit(&mut p, Some(500)).unwrap();
        assert_eq!(p["limit"], json!(10));

        let mut p = params(json!({}));
        clamp_limit(&mut p, Some(200)).unwrap();
        assert_eq!(p["limit"], json!(200));

        let mut p = params(json!({}));
        clamp_limit(&mut p, None).unwrap();
        assert!(!p.contains_key("limit"));
    }

    #[test]
    fn test_clamp_accepts_numeric_string() {
        let mut p = params(json!({"limit": "750"}));
        clamp_limit(&mut p, Some(500)).unwrap();
        assert_eq!(p["limit"], json!(500));
    }

    #[test]
    fn test_clamp_rejects_bad_limits() {
        for bad in [json!(-1), json!("ten"), json!(1.5), json!([1])] {
            let mut p = params(json!({ "limit": bad }));
            assert!(clamp_limit(&mut p, Some(500)).is_err());
        }
    }

    #[test]
    fn test_unknown_param_rejected() {
        let err = parse_params::<KeyParams>(params(json!({"table_name": "t", "key": "1", "extra": 1})))
            .unwrap_err();
        assert_eq!(err.code(), RpcErrorCode::InvalidParams);
    }

    #[test]
    fn test_write_params_primary_key() {
        let p: WriteParams = parse_params(params(json!({
            "table_name": "customer", "pk": "customer_number", "row_data": {}
        })))
        .unwrap();
        assert_eq!(p.primary_key(), PrimaryKey::Field(FieldId::from("customer_number")));

        let p: WriteParams = parse_params(params(json!({
            "table_name": "config", "key": ["a", "b"], "row_data": {}
        })))
        .unwrap();
        assert_eq!(p.primary_key(), PrimaryKey::Explicit(Key::composite(["a", "b"])));

        let p: WriteParams =
            parse_params(params(json!({"table_name": "config", "row_data": {}}))).unwrap();
        assert_eq!(p.primary_key(), PrimaryKey::Explicit(Key::Absent));
    }
}
