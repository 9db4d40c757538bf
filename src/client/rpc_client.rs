//! JSON-RPC over HTTP POST

use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::keys::{FieldId, Key, PrimaryKey};
use crate::rpc::{Method, Outcome, RpcResponse, JSONRPC_VERSION};
use crate::table::ScanRange;

use super::errors::{ClientError, ClientResult};

/// Client for a gateway served by `HttpServer`.
///
/// Every call is one POST carrying a fresh numeric id. "Not found" comes back
/// as `None`, exactly as from the in-process store.
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Client for `http://host:port/`
    pub fn new(host: &str, port: u16) -> Self {
        Self::with_url(format!("http://{}:{}/", host, port))
    }

    /// Client for an explicit endpoint URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one request and returns its raw result.
    ///
    /// An error object in the reply becomes `ClientError::Rpc`.
    pub async fn call(&self, method: Method, params: Map<String, Value>) -> ClientResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": id,
            "method": method.as_str(),
            "params": params,
        });

        let reply: RpcResponse = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        match reply.outcome {
            Outcome::Result(value) => Ok(value),
            Outcome::Error(error) => Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            }),
        }
    }

    async fn call_as<T: DeserializeOwned>(
        &self,
        method: Method,
        params: Map<String, Value>,
    ) -> ClientResult<T> {
        let result = self.call(method, params).await?;
        serde_json::from_value(result).map_err(|source| ClientError::UnexpectedResult {
            method: method.as_str(),
            source,
        })
    }

    pub async fn write(&self, table: &str, pk: &PrimaryKey, record: &Value) -> ClientResult<()> {
        let mut params = table_params(table);
        let field = match pk {
            PrimaryKey::Explicit(_) => "key",
            PrimaryKey::Field(_) | PrimaryKey::Fields(_) => "pk",
        };
        params.insert(field.to_string(), to_value(pk));
        params.insert("row_data".to_string(), record.clone());
        self.call(Method::Write, params).await.map(|_| ())
    }

    /// Merged record as canonical text, or `None` if `key` does not exist
    pub async fn rewrite(&self, table: &str, key: &Key, patch: &Value) -> ClientResult<Option<String>> {
        let mut params = key_params(table, key);
        params.insert("update_data".to_string(), patch.clone());
        self.call_as(Method::Rewrite, params).await
    }

    pub async fn read(&self, table: &str, key: &Key) -> ClientResult<Option<Value>> {
        self.call_as(Method::Read, key_params(table, key)).await
    }

    pub async fn read_columns(
        &self,
        table: &str,
        key: &Key,
        columns: &[FieldId],
    ) -> ClientResult<Option<Map<String, Value>>> {
        let mut params = key_params(table, key);
        params.insert("column_list".to_string(), to_value(columns));
        self.call_as(Method::ReadColumns, params).await
    }

    pub async fn exists(&self, table: &str, key: &Key) -> ClientResult<bool> {
        self.call_as(Method::Exists, key_params(table, key)).await
    }

    /// Removed record, or `None` if `key` did not exist
    pub async fn delete(&self, table: &str, key: &Key) -> ClientResult<Option<Value>> {
        self.call_as(Method::Delete, key_params(table, key)).await
    }

    pub async fn first(&self, table: &str, key: Option<&Key>) -> ClientResult<Option<Value>> {
        let params = match key {
            Some(key) => key_params(table, key),
            None => table_params(table),
        };
        self.call_as(Method::First, params).await
    }

    pub async fn next(&self, table: &str, key: &Key) -> ClientResult<Option<Value>> {
        self.call_as(Method::Next, key_params(table, key)).await
    }

    /// Key texts within `range`; the server may cap the count further
    pub async fn table_keys(&self, table: &str, range: &ScanRange) -> ClientResult<Vec<String>> {
        self.call_as(Method::GetTableKeys, scan_params(table, range)).await
    }

    pub async fn table_rows(&self, table: &str, range: &ScanRange) -> ClientResult<Vec<Value>> {
        self.call_as(Method::GetTableRows, scan_params(table, range)).await
    }

    pub async fn table_items(
        &self,
        table: &str,
        range: &ScanRange,
    ) -> ClientResult<Vec<(String, Value)>> {
        self.call_as(Method::GetTableItems, scan_params(table, range)).await
    }

    pub async fn commit(&self) -> ClientResult<()> {
        self.call(Method::Commit, Map::new()).await.map(|_| ())
    }

    /// Dumps on the server side; `None` uses the server's default path
    pub async fn dump_all(&self, file_path: Option<&str>) -> ClientResult<usize> {
        self.call_as(Method::DumpAll, file_params(file_path)).await
    }

    /// Loads on the server side; refused unless the server allows it
    pub async fn load(&self, file_path: Option<&str>) -> ClientResult<usize> {
        self.call_as(Method::Load, file_params(file_path)).await
    }
}

// Keys, field ids and scalars always serialize
fn to_value<T: serde::Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn table_params(table: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("table_name".to_string(), Value::from(table));
    params
}

fn key_params(table: &str, key: &Key) -> Map<String, Value> {
    let mut params = table_params(table);
    params.insert("key".to_string(), to_value(key));
    params
}

fn scan_params(table: &str, range: &ScanRange) -> Map<String, Value> {
    let mut params = table_params(table);
    if let Some(start) = &range.start_key {
        params.insert("start_key".to_string(), to_value(start));
    }
    if let Some(end) = &range.end_key {
        params.insert("end_key".to_string(), to_value(end));
    }
    if let Some(limit) = range.limit {
        params.insert("limit".to_string(), Value::from(limit));
    }
    params
}

fn file_params(file_path: Option<&str>) -> Map<String, Value> {
    let mut params = Map::new();
    if let Some(path) = file_path {
        params.insert("file_path".to_string(), Value::from(path));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::DumpFormat;
    use crate::engine::MemoryEngine;
    use crate::http_server::{rpc_routes, RpcState};
    use crate::rpc::{GatewayConfig, RpcErrorCode, RpcGateway};
    use crate::table::{StoreOptions, TableStore};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    /// Serves a fresh in-memory gateway on an ephemeral port.
    async fn serve(config: GatewayConfig, dump_dir: &TempDir) -> RpcClient {
        let store = TableStore::open(MemoryEngine::new(), StoreOptions::default()).unwrap();
        let gateway = RpcGateway::new(
            store,
            DumpFormat::default(),
            dump_dir.path().join("simple.db.dump.txt"),
            config,
        );
        let router = rpc_routes(Arc::new(RpcState::new(gateway)));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        RpcClient::new("127.0.0.1", addr.port())
    }

    fn customer_pk() -> PrimaryKey {
        PrimaryKey::Field(FieldId::from("customer_number"))
    }

    #[tokio::test]
    async fn test_remote_crud() {
        let dir = TempDir::new().unwrap();
        let client = serve(GatewayConfig::default(), &dir).await;
        let key = Key::single("000100");

        client
            .write(
                "customer",
                &customer_pk(),
                &json!({"customer_number": "000100", "name": "Curt", "dob": 19560606}),
            )
            .await
            .unwrap();
        assert!(client.exists("customer", &key).await.unwrap());

        let merged = client
            .rewrite("customer", &key, &json!({"location": "Alaska"}))
            .await
            .unwrap()
            .unwrap();
        assert!(merged.contains("Alaska"));

        let columns = client
            .read_columns("customer", &key, &[FieldId::from("name"), FieldId::from("bad_field")])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(columns["name"], "Curt");
        assert!(columns["bad_field"].is_null());

        let removed = client.delete("customer", &key).await.unwrap().unwrap();
        assert_eq!(removed["location"], "Alaska");
        assert_eq!(client.read("customer", &key).await.unwrap(), None);
        assert_eq!(client.delete("customer", &key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remote_cursor_and_scans() {
        let dir = TempDir::new().unwrap();
        let client = serve(GatewayConfig::default(), &dir).await;

        for line in 1..=3 {
            client
                .write(
                    "order_line",
                    &PrimaryKey::Explicit(Key::composite(["090001".to_string(), line.to_string()])),
                    &json!({"line": line}),
                )
                .await
                .unwrap();
        }

        let mut seen = Vec::new();
        let mut row = client.first("order_line", None).await.unwrap();
        while let Some(current) = row {
            let line = current["line"].as_i64().unwrap();
            seen.push(line);
            let key = Key::composite(["090001".to_string(), line.to_string()]);
            row = client.next("order_line", &key).await.unwrap();
        }
        assert_eq!(seen, vec![1, 2, 3]);

        let keys = client
            .table_keys("order_line", &ScanRange::limited(2))
            .await
            .unwrap();
        assert_eq!(keys, vec!["090001.1", "090001.2"]);

        let items = client.table_items("order_line", &ScanRange::all()).await.unwrap();
        assert_eq!(items[2], ("090001.3".to_string(), json!({"line": 3})));
        assert_eq!(client.table_rows("order_line", &ScanRange::all()).await.unwrap().len(), 3);

        client.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_remote_errors_are_typed() {
        let dir = TempDir::new().unwrap();
        let client = serve(GatewayConfig::default(), &dir).await;

        let err = client
            .write("customer", &PrimaryKey::Explicit(Key::Absent), &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.rpc_code(), Some(RpcErrorCode::InvalidParams));

        let err = client.load(None).await.unwrap_err();
        assert_eq!(err.rpc_code(), Some(RpcErrorCode::MethodNotFound));
    }

    #[tokio::test]
    async fn test_remote_dump_and_load() {
        let dir = TempDir::new().unwrap();
        let client = serve(
            GatewayConfig {
                allow_load: true,
                ..GatewayConfig::default()
            },
            &dir,
        )
        .await;
        let key = Key::single("1");

        client
            .write("t", &PrimaryKey::Explicit(key.clone()), &json!({"v": 1}))
            .await
            .unwrap();
        assert_eq!(client.dump_all(None).await.unwrap(), 1);

        client.delete("t", &key).await.unwrap();
        assert_eq!(client.load(None).await.unwrap(), 1);
        assert_eq!(client.read("t", &key).await.unwrap(), Some(json!({"v": 1})));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = RpcClient::new("127.0.0.1", port);
        let err = client.commit().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
