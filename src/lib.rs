//! tablestore - named tables over one ordered key-value engine
//!
//! Keys are `table.component.component`, records are JSON values stored
//! with a pluggable codec, and the whole store is reachable over JSON-RPC.

pub mod cli;
pub mod client;
pub mod dump;
pub mod engine;
pub mod http_server;
pub mod journal;
pub mod keys;
pub mod observability;
pub mod record;
pub mod rpc;
pub mod table;
