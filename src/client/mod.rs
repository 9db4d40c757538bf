//! Remote access to a served store
//!
//! `RpcClient` speaks the JSON-RPC protocol over HTTP POST and mirrors the
//! `TableStore` operations with the same argument and result types, so
//! callers can switch between in-process and remote use.

mod errors;
mod rpc_client;

pub use errors::{ClientError, ClientResult};
pub use rpc_client::RpcClient;
