//! Table isolation over a shared engine
//!
//! Tables share one key space. Range operations must never leak records of
//! a table whose name extends another's, nor stop early at a neighbour.

use serde_json::json;
use tablestore::engine::{Engine, LogEngine, MemoryEngine};
use tablestore::keys::{Key, PrimaryKey};
use tablestore::table::{ScanRange, StoreOptions, TableStore};
use tempfile::TempDir;

fn explicit(key: &str) -> PrimaryKey {
    PrimaryKey::Explicit(Key::single(key))
}

fn populate<E: Engine>(store: &mut TableStore<E>) {
    for (table, key) in [
        ("cust", "1"),
        ("customer", "000100"),
        ("customer", "000200"),
        ("customer_x", "9"),
        ("customers", "5"),
        ("order", "1"),
    ] {
        store
            .write(table, &explicit(key), &json!({"table": table, "key": key}))
            .unwrap();
    }
}

#[test]
fn test_prefix_tables_do_not_leak() {
    let mut store = TableStore::open(MemoryEngine::new(), StoreOptions::default()).unwrap();
    populate(&mut store);

    assert_eq!(
        store.table_keys("customer", &ScanRange::all()).unwrap(),
        vec!["000100", "000200"]
    );
    assert_eq!(store.table_keys("cust", &ScanRange::all()).unwrap(), vec!["1"]);
    assert_eq!(store.table_keys("customers", &ScanRange::all()).unwrap(), vec!["5"]);
}

#[test]
fn test_cursor_stops_at_table_end() {
    let mut store = TableStore::open(MemoryEngine::new(), StoreOptions::default()).unwrap();
    populate(&mut store);

    let last = store.next("customer", &Key::single("000100")).unwrap().unwrap();
    assert_eq!(last["key"], "000200");
    assert!(store.next("customer", &Key::single("000200")).unwrap().is_none());
}

#[test]
fn test_same_key_in_two_tables_is_two_records() {
    let mut store = TableStore::open(MemoryEngine::new(), StoreOptions::default()).unwrap();
    populate(&mut store);

    store.delete("cust", &Key::single("1")).unwrap();
    assert!(!store.exists("cust", &Key::single("1")).unwrap());
    assert_eq!(store.read("order", &Key::single("1")).unwrap().unwrap()["table"], "order");
}

#[test]
fn test_isolation_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("simple.db");

    {
        let mut store =
            TableStore::open(LogEngine::open(&path).unwrap(), StoreOptions::default()).unwrap();
        populate(&mut store);
        store.close().unwrap();
    }

    let store = TableStore::open(LogEngine::open(&path).unwrap(), StoreOptions::default()).unwrap();
    let rows = store.table_rows("customer", &ScanRange::all()).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row["table"] == "customer"));
}

#[test]
fn test_invalid_table_names_rejected() {
    let mut store = TableStore::open(MemoryEngine::new(), StoreOptions::default()).unwrap();

    assert!(store.write("", &explicit("1"), &json!(1)).is_err());
    assert!(store.write("a.b", &explicit("1"), &json!(1)).is_err());
    assert!(store.table_keys("a.b", &ScanRange::all()).is_err());
}
