//! Request dispatch
//!
//! Flow per request, no state carried between requests:
//!
//! 1. Parse body
//! 2. Validate envelope (id is echoed from here on)
//! 3. Resolve method against the registry and the deployment policy
//! 4. Clamp `limit` to the method's ceiling
//! 5. Dispatch to the store with typed parameters
//! 6. Wrap result or error

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::dump::DumpFormat;
use crate::engine::Engine;
use crate::observability::{log_event_with_fields, Event};
use crate::table::TableStore;

use super::errors::{RpcError, RpcResult};
use super::methods::{GatewayConfig, Method};
use super::query::envelope_from_query;
use super::request::{
    clamp_limit, parse_params, FileParams, FirstParams, KeyParams, NoParams, ReadColumnsParams,
    RewriteParams, RpcRequest, ScanParams, WriteParams,
};
use super::response::RpcResponse;

/// JSON-RPC front end for one table store
pub struct RpcGateway<E: Engine> {
    store: TableStore<E>,
    dump: DumpFormat,
    default_dump_path: PathBuf,
    config: GatewayConfig,
}

impl<E: Engine> RpcGateway<E> {
    /// Create a gateway.
    ///
    /// `default_dump_path` is used by `dumpAll`/`load` when the caller gives
    /// no `file_path`.
    pub fn new(
        store: TableStore<E>,
        dump: DumpFormat,
        default_dump_path: impl Into<PathBuf>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            store,
            dump,
            default_dump_path: default_dump_path.into(),
            config,
        }
    }

    /// Deployment policy
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The underlying store
    pub fn store(&self) -> &TableStore<E> {
        &self.store
    }

    /// The underlying store, mutably
    pub fn store_mut(&mut self) -> &mut TableStore<E> {
        &mut self.store
    }

    /// Handle a raw request body
    pub fn handle(&mut self, body: &str) -> RpcResponse {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => self.handle_value(value),
            Err(e) => self.reject(Value::Null, RpcError::parse_error(e.to_string())),
        }
    }

    /// Handle query-string pairs
    pub fn handle_query<K, V>(&mut self, pairs: &[(K, V)]) -> RpcResponse
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.handle_value(envelope_from_query(pairs))
    }

    /// Handle an already parsed request body
    pub fn handle_value(&mut self, body: Value) -> RpcResponse {
        let id = RpcRequest::peek_id(&body);
        let request = match RpcRequest::from_value(body) {
            Ok(request) => request,
            Err(e) => return self.reject(id, e),
        };

        let method = match Method::from_name(&request.method) {
            Some(method) if self.config.is_allowed(method) => method,
            _ => return self.reject(request.id, RpcError::method_not_found()),
        };

        let mut params = request.params;
        if let Err(e) = clamp_limit(&mut params, self.config.ceilings.for_method(method)) {
            return self.reject(request.id, e);
        }

        log_event_with_fields(Event::RpcRequest, &[("method", method.as_str())]);
        match self.dispatch(method, params) {
            Ok(result) => RpcResponse::success(request.id, result),
            Err(e) => {
                let code = e.code().to_string();
                log_event_with_fields(
                    Event::RpcFailed,
                    &[("code", code.as_str()), ("message", e.message()), ("method", method.as_str())],
                );
                RpcResponse::error(request.id, &e)
            }
        }
    }

    fn reject(&self, id: Value, err: RpcError) -> RpcResponse {
        let code = err.code().to_string();
        log_event_with_fields(
            Event::RpcRejected,
            &[("code", code.as_str()), ("message", err.message())],
        );
        RpcResponse::error(id, &err)
    }

    fn dispatch(&mut self, method: Method, params: Map<String, Value>) -> RpcResult<Value> {
        match method {
            Method::Write => {
                let p: WriteParams = parse_params(params)?;
                self.store
                    .write(&p.table_name, &p.primary_key(), &p.row_data)
                    .map_err(RpcError::from_table_error)?;
                Ok(Value::Null)
            }
            Method::Rewrite => {
                let p: RewriteParams = parse_params(params)?;
                let merged = self
                    .store
                    .rewrite(&p.table_name, &p.key, &p.update_data)
                    .map_err(RpcError::from_table_error)?;
                Ok(merged.map(Value::String).unwrap_or(Value::Null))
            }
            Method::Exists => {
                let p: KeyParams = parse_params(params)?;
                let found = self
                    .store
                    .exists(&p.table_name, &p.key)
                    .map_err(RpcError::from_table_error)?;
                Ok(Value::Bool(found))
            }
            Method::Read => {
                let p: KeyParams = parse_params(params)?;
                let record = self
                    .store
                    .read(&p.table_name, &p.key)
                    .map_err(RpcError::from_table_error)?;
                Ok(record.unwrap_or(Value::Null))
            }
            Method::ReadColumns => {
                let p: ReadColumnsParams = parse_params(params)?;
                let columns = self
                    .store
                    .read_columns(&p.table_name, &p.key, &p.column_list)
                    .map_err(RpcError::from_table_error)?;
                Ok(columns.map(Value::Object).unwrap_or(Value::Null))
            }
            Method::First => {
                let p: FirstParams = parse_params(params)?;
                let record = self
                    .store
                    .first(&p.table_name, p.key.as_ref())
                    .map_err(RpcError::from_table_error)?;
                Ok(record.unwrap_or(Value::Null))
            }
            Method::Next => {
                let p: KeyParams = parse_params(params)?;
                let record = self
                    .store
                    .next(&p.table_name, &p.key)
                    .map_err(RpcError::from_table_error)?;
                Ok(record.unwrap_or(Value::Null))
            }
            Method::GetTableKeys => {
                let p: ScanParams = parse_params(params)?;
                let keys = self
                    .store
                    .table_keys(&p.table_name, &p.range())
                    .map_err(RpcError::from_table_error)?;
                Ok(Value::from(keys))
            }
            Method::GetTableRows => {
                let p: ScanParams = parse_params(params)?;
                let rows = self
                    .store
                    .table_rows(&p.table_name, &p.range())
                    .map_err(RpcError::from_table_error)?;
                Ok(Value::Array(rows))
            }
            Method::GetTableItems => {
                let p: ScanParams = parse_params(params)?;
                let items = self
                    .store
                    .table_items(&p.table_name, &p.range())
                    .map_err(RpcError::from_table_error)?;
                Ok(Value::Array(
                    items
                        .into_iter()
                        .map(|(key, record)| Value::Array(vec![Value::String(key), record]))
                        .collect(),
                ))
            }
            Method::Delete => {
                let p: KeyParams = parse_params(params)?;
                let record = self
                    .store
                    .delete(&p.table_name, &p.key)
                    .map_err(RpcError::from_table_error)?;
                Ok(record.unwrap_or(Value::Null))
            }
            Method::Commit => {
                let _: NoParams = parse_params(params)?;
                self.store.commit().map_err(RpcError::from_table_error)?;
                Ok(Value::Null)
            }
            Method::DumpAll => {
                let p: FileParams = parse_params(params)?;
                let path = self.dump_path(p.file_path.as_deref());
                let written = self
                    .dump
                    .dump_all(&self.store, &path)
                    .map_err(RpcError::from_dump_error)?;
                Ok(Value::from(written))
            }
            Method::Load => {
                let p: FileParams = parse_params(params)?;
                let path = self.dump_path(p.file_path.as_deref());
                let applied = self
                    .dump
                    .load(&mut self.store, &path)
                    .map_err(RpcError::from_dump_error)?;
                Ok(Value::from(applied))
            }
        }
    }

    fn dump_path(&self, requested: Option<&str>) -> PathBuf {
        match requested {
            Some(path) if !path.is_empty() => Path::new(path).to_path_buf(),
            _ => self.default_dump_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::rpc::errors::RpcErrorCode;
    use crate::table::StoreOptions;
    use serde_json::json;
    use tempfile::TempDir;

    fn gateway(config: GatewayConfig) -> RpcGateway<MemoryEngine> {
        let store = TableStore::open(MemoryEngine::new(), StoreOptions::default()).unwrap();
        RpcGateway::new(store, DumpFormat::default(), "unused.dump.txt", config)
    }

    fn call(gw: &mut RpcGateway<MemoryEngine>, method: &str, params: Value) -> RpcResponse {
        gw.handle_value(json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 1}))
    }

    fn error_code(reply: &RpcResponse) -> i64 {
        reply.error_object().map(|e| e.code).unwrap_or(0)
    }

    #[test]
    fn test_parse_error() {
        let mut gw = gateway(GatewayConfig::default());
        let reply = gw.handle("{not json");
        assert_eq!(error_code(&reply), RpcErrorCode::ParseError.code());
        assert_eq!(reply.id, Value::Null);
    }

    #[test]
    fn test_invalid_request_echoes_id() {
        let mut gw = gateway(GatewayConfig::default());
        let reply = gw.handle(r#"{"jsonrpc":"2.0","method":"read","id":"abc"}"#);
        assert_eq!(error_code(&reply), RpcErrorCode::InvalidRequest.code());
        assert_eq!(reply.id, json!("abc"));
    }

    #[test]
    fn test_unknown_and_disallowed_methods() {
        let mut gw = gateway(GatewayConfig::default());
        let reply = call(&mut gw, "close", json!({}));
        assert_eq!(error_code(&reply), RpcErrorCode::MethodNotFound.code());
        let reply = call(&mut gw, "load", json!({}));
        assert_eq!(error_code(&reply), RpcErrorCode::MethodNotFound.code());
    }

    #[test]
    fn test_write_read_rewrite() {
        let mut gw = gateway(GatewayConfig::default());
        let reply = call(
            &mut gw,
            "write",
            json!({"table_name": "customer", "pk": "customer_number",
                   "row_data": {"customer_number": "000100", "name": "Curt", "dob": 19560606}}),
        );
        assert!(reply.is_success());

        let reply = call(
            &mut gw,
            "rewrite",
            json!({"table_name": "customer", "key": "000100", "update_data": {"location": "Alaska"}}),
        );
        let merged: Value = serde_json::from_str(reply.result().unwrap().as_str().unwrap()).unwrap();
        assert_eq!(merged["location"], "Alaska");

        let reply = call(&mut gw, "read", json!({"table_name": "customer", "key": "000100"}));
        assert_eq!(reply.result().unwrap()["name"], "Curt");

        let reply = call(&mut gw, "read", json!({"table_name": "customer", "key": "999999"}));
        assert_eq!(reply.result(), Some(&Value::Null));
    }

    #[test]
    fn test_write_without_key_is_invalid_params() {
        let mut gw = gateway(GatewayConfig::default());
        let reply = call(&mut gw, "write", json!({"table_name": "config", "row_data": {}}));
        assert_eq!(error_code(&reply), RpcErrorCode::InvalidParams.code());
    }

    #[test]
    fn test_write_with_empty_key_list_is_invalid_params() {
        let mut gw = gateway(GatewayConfig::default());
        let reply = call(&mut gw, "write", json!({"table_name": "t", "key": [], "row_data": {"v": 1}}));
        assert_eq!(error_code(&reply), RpcErrorCode::InvalidParams.code());

        let reply = call(&mut gw, "write", json!({"table_name": "t", "pk": [], "row_data": {"v": 2}}));
        assert_eq!(error_code(&reply), RpcErrorCode::InvalidParams.code());

        let reply = call(&mut gw, "read", json!({"table_name": "t", "key": []}));
        assert_eq!(reply.result(), Some(&Value::Null));
        assert!(gw.store().engine().is_empty());
    }

    #[test]
    fn test_bad_table_name_is_invalid_params() {
        let mut gw = gateway(GatewayConfig::default());
        let reply = call(&mut gw, "read", json!({"table_name": "a.b", "key": "1"}));
        assert_eq!(error_code(&reply), RpcErrorCode::InvalidParams.code());
    }

    #[test]
    fn test_missing_pk_field_is_store_error() {
        let mut gw = gateway(GatewayConfig::default());
        let reply = call(
            &mut gw,
            "write",
            json!({"table_name": "customer", "pk": "customer_number", "row_data": {"name": "x"}}),
        );
        assert_eq!(error_code(&reply), RpcErrorCode::StoreCallError.code());
        assert!(reply.error_object().unwrap().message.contains("customer_number"));
    }

    #[test]
    fn test_read_only_refuses_writes() {
        let mut gw = gateway(GatewayConfig {
            read_only: true,
            ..GatewayConfig::default()
        });
        let reply = call(&mut gw, "write", json!({"table_name": "t", "key": "1", "row_data": {}}));
        assert_eq!(error_code(&reply), RpcErrorCode::MethodNotFound.code());
        let reply = call(&mut gw, "exists", json!({"table_name": "t", "key": "1"}));
        assert_eq!(reply.result(), Some(&json!(false)));
    }

    #[test]
    fn test_items_are_pairs() {
        let mut gw = gateway(GatewayConfig::default());
        call(&mut gw, "write", json!({"table_name": "t", "key": ["a", "b"], "row_data": [1]}));
        let reply = call(&mut gw, "getTableItems", json!({"table_name": "t"}));
        assert_eq!(reply.result(), Some(&json!([["a.b", [1]]])));
    }

    #[test]
    fn test_limit_ceiling_applied() {
        let mut gw = gateway(GatewayConfig::default());
        for i in 0..250 {
            call(&mut gw, "write", json!({"table_name": "t", "key": format!("{:04}", i), "row_data": i}));
        }
        let reply = call(&mut gw, "getTableRows", json!({"table_name": "t", "limit": 1000}));
        assert_eq!(reply.result().unwrap().as_array().unwrap().len(), 200);
        let reply = call(&mut gw, "getTableItems", json!({"table_name": "t"}));
        assert_eq!(reply.result().unwrap().as_array().unwrap().len(), 100);
        let reply = call(&mut gw, "getTableKeys", json!({"table_name": "t", "limit": 0}));
        assert_eq!(reply.result(), Some(&json!([])));
    }

    #[test]
    fn test_cursor_over_rpc() {
        let mut gw = gateway(GatewayConfig::default());
        for key in ["b", "a", "c"] {
            call(&mut gw, "write", json!({"table_name": "t", "pk": "k", "row_data": {"k": key}}));
        }
        let mut seen = Vec::new();
        let mut reply = call(&mut gw, "first", json!({"table_name": "t"}));
        while let Some(row) = reply.result().filter(|r| !r.is_null()).cloned() {
            let key = row["k"].as_str().unwrap().to_string();
            reply = call(&mut gw, "next", json!({"table_name": "t", "key": key.clone()}));
            seen.push(key);
        }
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dump_and_load_over_rpc() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gw.dump.txt");
        let path_text = path.to_str().unwrap();

        let mut source = gateway(GatewayConfig::default());
        call(&mut source, "write", json!({"table_name": "t", "key": "1", "row_data": {"v": 1}}));
        let reply = call(&mut source, "dumpAll", json!({"file_path": path_text}));
        assert_eq!(reply.result(), Some(&json!(1)));

        let mut target = gateway(GatewayConfig {
            allow_load: true,
            ..GatewayConfig::default()
        });
        let reply = call(&mut target, "load", json!({"file_path": path_text}));
        assert_eq!(reply.result(), Some(&json!(1)));
        let reply = call(&mut target, "read", json!({"table_name": "t", "key": "1"}));
        assert_eq!(reply.result(), Some(&json!({"v": 1})));
    }

    #[test]
    fn test_query_adapter() {
        let mut gw = gateway(GatewayConfig::default());
        let reply = gw.handle_query(&[
            ("method", "write"),
            ("table_name", "customer"),
            ("pk", "customer_number"),
            ("row_data", r#"{"customer_number":"000100","name":"Curt"}"#),
        ]);
        assert!(reply.is_success(), "{:?}", reply);

        let reply = gw.handle_query(&[
            ("method", "readColumns"),
            ("id", "7"),
            ("table_name", "customer"),
            ("key", "000100"),
            ("column_list", "name"),
        ]);
        assert_eq!(reply.id, json!("7"));
        assert_eq!(reply.result(), Some(&json!({"name": "Curt"})));
    }
}
