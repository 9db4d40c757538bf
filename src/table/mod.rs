//! Table store
//!
//! CRUD, cursor and range operations over named tables that share one
//! ordered engine.
//!
//! # Supported Operations
//!
//! - write / rewrite / delete
//! - read / read_columns / exists
//! - first / next (stateless forward cursor)
//! - table_keys / table_rows / table_items (bounded range scans)
//! - commit / close

mod errors;
mod store;

pub use errors::{TableError, TableResult};
pub use store::{CommitMode, ScanRange, StoreConfiguration, StoreOptions, TableStore};
