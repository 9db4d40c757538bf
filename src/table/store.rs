//! Multi-table record store over an ordered engine
//!
//! Every operation encodes its key through the `KeyCodec` and its payload
//! through the injected `RecordCodec`. Range operations bound their scan to
//! `[table SEP, table SEP 0xFF)`, so table isolation comes from the engine's
//! ordered iteration alone.

use std::ops::Bound;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::Engine;
use crate::keys::{FieldId, Key, KeyCodec, PrimaryKey};
use crate::observability::{log_event_with_fields, Event};
use crate::record::{canonical_text, CodecKind, RecordCodec};

use super::errors::{TableError, TableResult};

/// Durability policy, fixed when the store is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Flush the engine after every mutating call
    #[default]
    Auto,
    /// Flush only on explicit `commit`
    Manual,
}

impl CommitMode {
    /// Configuration name
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitMode::Auto => "auto",
            CommitMode::Manual => "manual",
        }
    }
}

/// Construction options for a `TableStore`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub key_separator: char,
    pub codec: CodecKind,
    pub commit_mode: CommitMode,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key_separator: crate::keys::DEFAULT_SEPARATOR,
            codec: CodecKind::Json,
            commit_mode: CommitMode::Auto,
        }
    }
}

/// Optional bounds and result cap for table scans.
///
/// Missing bounds default to the table's full range; `end_key` is exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRange {
    pub start_key: Option<Key>,
    pub end_key: Option<Key>,
    pub limit: Option<usize>,
}

impl ScanRange {
    /// Whole table, no cap
    pub fn all() -> Self {
        Self::default()
    }

    /// Whole table, at most `limit` results
    pub fn limited(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// `[start, end)` with no cap
    pub fn between(start: impl Into<Key>, end: impl Into<Key>) -> Self {
        Self {
            start_key: Some(start.into()),
            end_key: Some(end.into()),
            limit: None,
        }
    }
}

/// Settings a store was opened with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreConfiguration {
    pub key_separator: char,
    pub record_codec: &'static str,
    pub commit_mode: CommitMode,
}

/// Named tables over one ordered engine.
pub struct TableStore<E: Engine> {
    engine: E,
    keys: KeyCodec,
    codec: Box<dyn RecordCodec>,
    commit_mode: CommitMode,
}

impl<E: Engine> TableStore<E> {
    /// Create a store from explicit parts.
    pub fn new(
        engine: E,
        keys: KeyCodec,
        codec: Box<dyn RecordCodec>,
        commit_mode: CommitMode,
    ) -> Self {
        let store = Self {
            engine,
            keys,
            codec,
            commit_mode,
        };
        let separator = store.keys.separator().to_string();
        log_event_with_fields(
            Event::StoreOpened,
            &[
                ("commit_mode", store.commit_mode.as_str()),
                ("key_separator", separator.as_str()),
                ("record_codec", store.codec.name()),
            ],
        );
        store
    }

    /// Create a store from options.
    pub fn open(engine: E, options: StoreOptions) -> TableResult<Self> {
        let keys = KeyCodec::new(options.key_separator)?;
        Ok(Self::new(engine, keys, options.codec.build(), options.commit_mode))
    }

    /// Settings this store was opened with
    pub fn configuration(&self) -> StoreConfiguration {
        StoreConfiguration {
            key_separator: self.keys.separator(),
            record_codec: self.codec.name(),
            commit_mode: self.commit_mode,
        }
    }

    /// Unconditionally inserts or replaces `record`.
    ///
    /// The key is derived from the record's fields, or taken verbatim for
    /// `PrimaryKey::Explicit`.
    pub fn write(&mut self, table: &str, pk: &PrimaryKey, record: &Value) -> TableResult<()> {
        let db_key = self.keys.derive_key(table, pk, record)?;
        let bytes = self.codec.encode(record)?;
        self.engine.set(&db_key, &bytes)?;
        self.auto_commit()
    }

    /// Shallow-merges `patch` into the record under `key`.
    ///
    /// Returns the canonical text of the merged record, or `None` if the key
    /// does not exist (nothing is written in that case).
    pub fn rewrite(&mut self, table: &str, key: &Key, patch: &Value) -> TableResult<Option<String>> {
        let patch = patch.as_object().ok_or(TableError::InvalidPatch)?;
        let db_key = self.keys.encode(table, key)?;

        let mut record = match self.engine.get(&db_key)? {
            Some(bytes) => self.decode_record(&db_key, &bytes)?,
            None => return Ok(None),
        };

        let fields = record
            .as_object_mut()
            .ok_or_else(|| TableError::NotMergeable(String::from_utf8_lossy(&db_key).into_owned()))?;
        for (name, value) in patch {
            fields.insert(name.clone(), value.clone());
        }

        let reply = canonical_text(&record);
        let bytes = self.codec.encode(&record)?;
        self.engine.set(&db_key, &bytes)?;
        self.auto_commit()?;
        Ok(Some(reply))
    }

    /// Reads the record under `key`.
    pub fn read(&self, table: &str, key: &Key) -> TableResult<Option<Value>> {
        let db_key = self.keys.encode(table, key)?;
        match self.engine.get(&db_key)? {
            Some(bytes) => self.decode_record(&db_key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Reads selected columns of the record under `key`.
    ///
    /// Each requested column maps to its value, or `null` if the record has
    /// no such column. `None` if the key itself does not exist.
    pub fn read_columns(
        &self,
        table: &str,
        key: &Key,
        columns: &[FieldId],
    ) -> TableResult<Option<Map<String, Value>>> {
        let record = match self.read(table, key)? {
            Some(record) => record,
            None => return Ok(None),
        };

        let selected = columns
            .iter()
            .map(|col| (col.to_string(), col.lookup(&record).cloned().unwrap_or(Value::Null)))
            .collect();
        Ok(Some(selected))
    }

    /// Whether a record exists under `key`.
    pub fn exists(&self, table: &str, key: &Key) -> TableResult<bool> {
        let db_key = self.keys.encode(table, key)?;
        Ok(self.engine.contains(&db_key)?)
    }

    /// Removes the record under `key`, returning it.
    ///
    /// Deleting an absent key is a no-op returning `None`.
    pub fn delete(&mut self, table: &str, key: &Key) -> TableResult<Option<Value>> {
        let db_key = self.keys.encode(table, key)?;
        let record = match self.engine.get(&db_key)? {
            Some(bytes) => self.decode_record(&db_key, &bytes)?,
            None => return Ok(None),
        };

        self.engine.delete(&db_key)?;
        self.auto_commit()?;
        Ok(Some(record))
    }

    /// First record at or after `key` (default: the start of the table).
    pub fn first(&self, table: &str, key: Option<&Key>) -> TableResult<Option<Value>> {
        let start = match key {
            Some(key) => self.keys.encode(table, key)?,
            None => self.keys.lower_bound(table)?,
        };
        self.first_in(table, Bound::Included(&start))
    }

    /// First record strictly after `key`.
    ///
    /// Cursor protocol: pass the key of the previously returned record to
    /// advance. No state is held between calls.
    pub fn next(&self, table: &str, key: &Key) -> TableResult<Option<Value>> {
        let after = self.keys.encode(table, key)?;
        self.first_in(table, Bound::Excluded(&after))
    }

    fn first_in(&self, table: &str, start: Bound<&Vec<u8>>) -> TableResult<Option<Value>> {
        let high = self.keys.upper_bound(table)?;
        let start = start.map(Vec::as_slice);
        let mut iter = self.engine.range(start, Bound::Excluded(high.as_slice()))?;
        match iter.next() {
            Some((db_key, bytes)) => self.decode_record(db_key, bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Keys of `table` within `range`, in ascending order.
    ///
    /// Each key is returned as its text after the table prefix.
    pub fn table_keys(&self, table: &str, range: &ScanRange) -> TableResult<Vec<String>> {
        let (low, high) = self.scan_bounds(table, range)?;
        self.engine
            .keys(&low, &high)?
            .take(range.limit.unwrap_or(usize::MAX))
            .map(|db_key| -> TableResult<String> { Ok(self.keys.decode(db_key)?.key_text) })
            .collect()
    }

    /// Records of `table` within `range`, in ascending key order.
    pub fn table_rows(&self, table: &str, range: &ScanRange) -> TableResult<Vec<Value>> {
        let (low, high) = self.scan_bounds(table, range)?;
        self.engine
            .items(&low, &high)?
            .take(range.limit.unwrap_or(usize::MAX))
            .map(|(db_key, bytes)| self.decode_record(db_key, bytes))
            .collect()
    }

    /// `(key text, record)` pairs of `table` within `range`.
    pub fn table_items(&self, table: &str, range: &ScanRange) -> TableResult<Vec<(String, Value)>> {
        let (low, high) = self.scan_bounds(table, range)?;
        self.engine
            .items(&low, &high)?
            .take(range.limit.unwrap_or(usize::MAX))
            .map(|(db_key, bytes)| -> TableResult<(String, Value)> {
                let key_text = self.keys.decode(db_key)?.key_text;
                Ok((key_text, self.decode_record(db_key, bytes)?))
            })
            .collect()
    }

    /// Flushes pending writes to durable storage.
    pub fn commit(&mut self) -> TableResult<()> {
        Ok(self.engine.flush()?)
    }

    /// Flushes and closes the engine.
    pub fn close(&mut self) -> TableResult<()> {
        self.engine.close()?;
        log_event_with_fields(Event::StoreClosed, &[]);
        Ok(())
    }

    /// The key codec in use
    pub fn key_codec(&self) -> &KeyCodec {
        &self.keys
    }

    /// The record codec in use
    pub fn record_codec(&self) -> &dyn RecordCodec {
        self.codec.as_ref()
    }

    /// The underlying engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The underlying engine, mutably
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    fn auto_commit(&mut self) -> TableResult<()> {
        if self.commit_mode == CommitMode::Auto {
            self.engine.flush()?;
        }
        Ok(())
    }

    fn scan_bounds(&self, table: &str, range: &ScanRange) -> TableResult<(Vec<u8>, Vec<u8>)> {
        let low = match &range.start_key {
            Some(key) => self.keys.encode(table, key)?,
            None => self.keys.lower_bound(table)?,
        };
        let high = match &range.end_key {
            Some(key) => self.keys.encode(table, key)?,
            None => self.keys.upper_bound(table)?,
        };
        Ok((low, high))
    }

    fn decode_record(&self, db_key: &[u8], bytes: &[u8]) -> TableResult<Value> {
        self.codec.decode(bytes).map_err(|source| TableError::Corrupt {
            key: String::from_utf8_lossy(db_key).into_owned(),
            source,
        })
    }
}
