//! JSON-RPC error codes and the gateway error type
//!
//! Every failure a request can hit ends up here and is rendered into the
//! reply envelope as `{code, message}`.

use std::fmt;

use crate::dump::DumpError;
use crate::table::TableError;

/// Result type for gateway operations
pub type RpcResult<T> = Result<T, RpcError>;

/// JSON-RPC error codes used by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorCode {
    /// Request body is not valid JSON
    ParseError,
    /// Envelope is missing `jsonrpc`, `method` or `params`
    InvalidRequest,
    /// Method unknown or not allowed in this deployment
    MethodNotFound,
    /// Parameters missing, mistyped, unknown, or rejected by validation
    InvalidParams,
    /// Reply could not be produced
    InternalError,
    /// Gateway unavailable
    ServerError,
    /// Store operation failed; message forwarded
    StoreCallError,
}

impl RpcErrorCode {
    /// Numeric code on the wire
    pub fn code(&self) -> i64 {
        match self {
            RpcErrorCode::ParseError => -32700,
            RpcErrorCode::InvalidRequest => -32600,
            RpcErrorCode::MethodNotFound => -32601,
            RpcErrorCode::InvalidParams => -32602,
            RpcErrorCode::InternalError => -32603,
            RpcErrorCode::ServerError => -32000,
            RpcErrorCode::StoreCallError => -32001,
        }
    }

    /// Code for a wire value, if it is one the gateway emits
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -32700 => Some(RpcErrorCode::ParseError),
            -32600 => Some(RpcErrorCode::InvalidRequest),
            -32601 => Some(RpcErrorCode::MethodNotFound),
            -32602 => Some(RpcErrorCode::InvalidParams),
            -32603 => Some(RpcErrorCode::InternalError),
            -32000 => Some(RpcErrorCode::ServerError),
            -32001 => Some(RpcErrorCode::StoreCallError),
            _ => None,
        }
    }

    /// Default message for the code
    pub fn default_message(&self) -> &'static str {
        match self {
            RpcErrorCode::ParseError => "Parse error",
            RpcErrorCode::InvalidRequest => "Invalid request",
            RpcErrorCode::MethodNotFound => "Method not found",
            RpcErrorCode::InvalidParams => "Invalid method parameter(s)",
            RpcErrorCode::InternalError => "Internal JSON-RPC error",
            RpcErrorCode::ServerError => "Unknown error",
            RpcErrorCode::StoreCallError => "Store call error",
        }
    }
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A request-scoped gateway failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcError {
    code: RpcErrorCode,
    message: String,
}

impl RpcError {
    fn with_detail(code: RpcErrorCode, detail: Option<String>) -> Self {
        let message = match detail {
            Some(detail) => format!("{}: {}", code.default_message(), detail),
            None => code.default_message().to_string(),
        };
        Self { code, message }
    }

    /// Request body is not valid JSON
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::with_detail(RpcErrorCode::ParseError, Some(detail.into()))
    }

    /// Envelope is incomplete
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::with_detail(RpcErrorCode::InvalidRequest, Some(detail.into()))
    }

    /// Unknown or disallowed method. The name is not echoed.
    pub fn method_not_found() -> Self {
        Self::with_detail(RpcErrorCode::MethodNotFound, None)
    }

    /// Parameters rejected
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::with_detail(RpcErrorCode::InvalidParams, Some(detail.into()))
    }

    /// Reply could not be produced
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::with_detail(RpcErrorCode::InternalError, Some(detail.into()))
    }

    /// Gateway unavailable
    pub fn server_error(detail: impl Into<String>) -> Self {
        Self::with_detail(RpcErrorCode::ServerError, Some(detail.into()))
    }

    /// Store failure, message forwarded verbatim
    pub fn store_call(message: impl Into<String>) -> Self {
        Self {
            code: RpcErrorCode::StoreCallError,
            message: message.into(),
        }
    }

    /// Maps a table store failure.
    ///
    /// Input validation failures are parameter errors; everything else is a
    /// store call error.
    pub fn from_table_error(err: TableError) -> Self {
        if err.is_invalid_input() {
            Self::invalid_params(err.to_string())
        } else {
            Self::store_call(err.to_string())
        }
    }

    /// Maps a dump or load failure
    pub fn from_dump_error(err: DumpError) -> Self {
        match err {
            DumpError::Table(e) => Self::from_table_error(e),
            other => Self::store_call(other.to_string()),
        }
    }

    /// The error code
    pub fn code(&self) -> RpcErrorCode {
        self.code
    }

    /// The message sent to the client
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}
