//! JSON-RPC HTTP routes
//!
//! - `POST /`: raw JSON-RPC body
//! - `GET /?method=...`: query-string adapter
//! - `GET /health`
//!
//! Requests are serialized through one lock around the gateway: a single
//! writer, one request at a time. The locked store work runs on the blocking
//! pool so fsyncs never stall the async workers.

use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::engine::Engine;
use crate::rpc::{RpcError, RpcGateway, RpcResponse};

/// Shared state: the gateway behind its request lock
pub struct RpcState<E: Engine> {
    pub gateway: Mutex<RpcGateway<E>>,
}

impl<E: Engine> RpcState<E> {
    pub fn new(gateway: RpcGateway<E>) -> Self {
        Self {
            gateway: Mutex::new(gateway),
        }
    }

    /// Runs `f` with exclusive access to the gateway.
    ///
    /// A poisoned lock yields a server error reply instead of a panic.
    pub fn with_gateway<F>(&self, f: F) -> RpcResponse
    where
        F: FnOnce(&mut RpcGateway<E>) -> RpcResponse,
    {
        match self.gateway.lock() {
            Ok(mut gateway) => f(&mut gateway),
            Err(_) => RpcResponse::error(
                Value::Null,
                &RpcError::server_error("gateway unavailable after an earlier failure"),
            ),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create the JSON-RPC routes
pub fn rpc_routes<E: Engine + Send + 'static>(state: Arc<RpcState<E>>) -> Router {
    Router::new()
        .route("/", get(query_handler::<E>).post(body_handler::<E>))
        .route("/health", get(health_handler))
        .with_state(state)
}

fn json_reply(reply: RpcResponse) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        reply.to_json(),
    )
}

/// Runs `f` against the gateway on the blocking pool.
///
/// A task that dies before replying answers like a poisoned lock.
pub async fn run_blocking<E, F>(state: Arc<RpcState<E>>, f: F) -> RpcResponse
where
    E: Engine + Send + 'static,
    F: FnOnce(&mut RpcGateway<E>) -> RpcResponse + Send + 'static,
{
    match tokio::task::spawn_blocking(move || state.with_gateway(f)).await {
        Ok(reply) => reply,
        Err(e) => RpcResponse::error(
            Value::Null,
            &RpcError::server_error(format!("request task failed: {}", e)),
        ),
    }
}

async fn body_handler<E: Engine + Send + 'static>(
    State(state): State<Arc<RpcState<E>>>,
    body: Bytes,
) -> impl IntoResponse {
    let reply = match String::from_utf8(body.to_vec()) {
        Ok(text) => run_blocking(state, move |gateway| gateway.handle(&text)).await,
        Err(e) => RpcResponse::error(Value::Null, &RpcError::parse_error(e.to_string())),
    };
    json_reply(reply)
}

async fn query_handler<E: Engine + Send + 'static>(
    State(state): State<Arc<RpcState<E>>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    json_reply(run_blocking(state, move |gateway| gateway.handle_query(&pairs)).await)
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}
