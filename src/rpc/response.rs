//! JSON-RPC reply envelope
//!
//! Exactly one of `result` and `error` is present in every reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{RpcError, RpcErrorCode};

/// Protocol version string
pub const JSONRPC_VERSION: &str = "2.0";

/// Error object carried by a failed reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

impl From<&RpcError> for ErrorObject {
    fn from(err: &RpcError) -> Self {
        Self {
            code: err.code().code(),
            message: err.message().to_string(),
        }
    }
}

/// Outcome of a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(ErrorObject),
}

/// Reply envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl RpcResponse {
    /// Successful reply echoing `id`
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: Outcome::Result(result),
        }
    }

    /// Failed reply echoing `id`
    pub fn error(id: Value, err: &RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: Outcome::Error(ErrorObject::from(err)),
        }
    }

    /// Whether the request succeeded
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Result(_))
    }

    /// The result value, if the request succeeded
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    /// The error object, if the request failed
    pub fn error_object(&self) -> Option<&ErrorObject> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(err) => Some(err),
        }
    }

    /// Serialize the reply.
    ///
    /// If serialization fails the reply degrades to an internal error that
    /// keeps the original id when possible.
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                let fallback = RpcResponse::error(self.id.clone(), &RpcError::internal(e.to_string()));
                serde_json::to_string(&fallback).unwrap_or_else(|_| {
                    format!(
                        r#"{{"jsonrpc":"{}","id":null,"error":{{"code":{},"message":"{}"}}}}"#,
                        JSONRPC_VERSION,
                        RpcErrorCode::InternalError.code(),
                        RpcErrorCode::InternalError.default_message()
                    )
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let reply = RpcResponse::success(json!("1"), json!(["000100"]));
        let value: Value = serde_json::from_str(&reply.to_json()).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": "1", "result": ["000100"]}));
    }

    #[test]
    fn test_error_shape() {
        let reply = RpcResponse::error(Value::Null, &RpcError::method_not_found());
        let value: Value = serde_json::from_str(&reply.to_json()).unwrap();
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32601, "message": "Method not found"}})
        );
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_null_result_is_present() {
        let reply = RpcResponse::success(json!(7), Value::Null);
        let value: Value = serde_json::from_str(&reply.to_json()).unwrap();
        assert!(value.as_object().unwrap().contains_key("result"));
        assert!(value["result"].is_null());
    }

    #[test]
    fn test_parse_reply() {
        let reply: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":true}"#).unwrap();
        assert_eq!(reply.result(), Some(&json!(true)));
    }
}
