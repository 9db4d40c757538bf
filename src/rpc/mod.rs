//! JSON-RPC gateway
//!
//! Validates, authorizes and dispatches JSON-RPC 2.0 requests to a
//! `TableStore`. This is the single error boundary: every failure is
//! returned inside the reply envelope.

mod errors;
mod gateway;
mod methods;
mod query;
mod request;
mod response;

pub use errors::{RpcError, RpcErrorCode, RpcResult};
pub use gateway::RpcGateway;
pub use methods::{Ceilings, GatewayConfig, Method};
pub use query::{envelope_from_query, ARRAY_PARAMETERS, SCALAR_PARAMETERS};
pub use request::{clamp_limit, RpcRequest};
pub use response::{ErrorObject, Outcome, RpcResponse, JSONRPC_VERSION};
