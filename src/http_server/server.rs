//! # HTTP Server
//!
//! Serves the JSON-RPC gateway over HTTP until interrupted, then closes the
//! store.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::engine::Engine;
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::rpc::RpcGateway;

use super::config::HttpServerConfig;
use super::rpc_routes::{rpc_routes, RpcState};

/// HTTP front end for one gateway
pub struct HttpServer<E: Engine + Send + 'static> {
    config: HttpServerConfig,
    state: Arc<RpcState<E>>,
}

impl<E: Engine + Send + 'static> HttpServer<E> {
    /// Create a server for `gateway`
    pub fn new(config: HttpServerConfig, gateway: RpcGateway<E>) -> Self {
        Self {
            config,
            state: Arc::new(RpcState::new(gateway)),
        }
    }

    fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
        if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }

    /// Build the router with CORS applied
    pub fn router(&self) -> Router {
        rpc_routes(self.state.clone()).layer(Self::cors_layer(&self.config))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Serve until Ctrl-C, then close the store.
    pub async fn start(self) -> io::Result<()> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid socket address '{}': {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        let addr_text = addr.to_string();
        log_event_with_fields(Event::Serving, &[("addr", addr_text.as_str())]);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.close();
        log_event(Event::ShutdownComplete);
        Ok(())
    }

    fn close(&self) {
        let result = match self.state.gateway.lock() {
            Ok(mut gateway) => gateway.store_mut().close().map_err(|e| e.to_string()),
            Err(_) => Err("gateway lock poisoned".to_string()),
        };
        if let Err(e) = result {
            Logger::error("STORE_CLOSE_FAILED", &[("error", e.as_str())]);
        }
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler: serve until the process is killed
        std::future::pending::<()>().await;
    }
}
