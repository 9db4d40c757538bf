//! Client errors

use thiserror::Error;

use crate::rpc::RpcErrorCode;

/// Result type for client calls
pub type ClientResult<T> = Result<T, ClientError>;

/// Remote call failures
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request never produced a reply envelope
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with an error object
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The result did not have the shape the method returns
    #[error("Unexpected result for {method}: {source}")]
    UnexpectedResult {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    /// Gateway error code, when the gateway answered with an error
    pub fn rpc_code(&self) -> Option<RpcErrorCode> {
        match self {
            ClientError::Rpc { code, .. } => RpcErrorCode::from_code(*code),
            _ => None,
        }
    }
}
