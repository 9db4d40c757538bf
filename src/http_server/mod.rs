//! HTTP transport for the JSON-RPC gateway

mod config;
mod rpc_routes;
mod server;

pub use config::HttpServerConfig;
pub use rpc_routes::{rpc_routes, HealthResponse, RpcState};
pub use server::HttpServer;
