//! Append-only journal table
//!
//! Rows are keyed by local date-time plus a zero-padded sequence number that
//! separates entries written within the same second:
//!
//! ```text
//! {"pk": ["2025-09-03 12:20:10", "00"], "type": "info", "log_entry": ...}
//! ```
//!
//! The sequence restarts at zero whenever the timestamp changes, so rows
//! sort in write order as long as one second never holds more entries than
//! the sequence width can express.
//!
//! Stores whose key separator is one of ` `, `-` or `:` get the digits-only
//! stamp `20250903122010` instead. A digit separator cannot hold journal
//! keys at all and every write fails with `InvalidComponent`.

use chrono::{Local, NaiveDateTime};
use serde_json::{json, Value};

use crate::engine::Engine;
use crate::keys::{Key, PrimaryKey};
use crate::table::{TableResult, TableStore};

/// Default journal table
pub const DEFAULT_JOURNAL_TABLE: &str = "log";

/// Default width of the sequence component
pub const DEFAULT_SEQUENCE_WIDTH: usize = 2;

/// Timestamp format of the first key component
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp format used when the key separator occurs in `DATE_TIME_FORMAT`
pub const COMPACT_DATE_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Stamp format whose output never contains `separator` (digits aside)
pub fn date_time_format(separator: char) -> &'static str {
    if matches!(separator, ' ' | '-' | ':') {
        COMPACT_DATE_TIME_FORMAT
    } else {
        DATE_TIME_FORMAT
    }
}

/// Writes timestamped entries into one table of a store.
#[derive(Debug, Clone)]
pub struct TableJournal {
    table: String,
    sequence_width: usize,
    last_stamp: String,
    sequence: u64,
}

impl Default for TableJournal {
    fn default() -> Self {
        Self::new(DEFAULT_JOURNAL_TABLE, DEFAULT_SEQUENCE_WIDTH)
    }
}

impl TableJournal {
    pub fn new(table: impl Into<String>, sequence_width: usize) -> Self {
        Self {
            table: table.into(),
            sequence_width: sequence_width.max(1),
            last_stamp: String::new(),
            sequence: 0,
        }
    }

    /// The journal table
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Appends an entry stamped with the current local time.
    pub fn write<E: Engine>(
        &mut self,
        store: &mut TableStore<E>,
        kind: &str,
        entry: Value,
    ) -> TableResult<Key> {
        self.write_at(store, Local::now().naive_local(), kind, entry)
    }

    /// Appends an entry stamped with `at`.
    ///
    /// Returns the key the entry was written under.
    pub fn write_at<E: Engine>(
        &mut self,
        store: &mut TableStore<E>,
        at: NaiveDateTime,
        kind: &str,
        entry: Value,
    ) -> TableResult<Key> {
        let format = date_time_format(store.key_codec().separator());
        let stamp = at.format(format).to_string();
        if stamp == self.last_stamp {
            self.sequence += 1;
        } else {
            self.last_stamp = stamp.clone();
            self.sequence = 0;
        }
        let sequence = format!("{:0width$}", self.sequence, width = self.sequence_width);

        let key = Key::composite([stamp.clone(), sequence.clone()]);
        let row = json!({
            "pk": [stamp, sequence],
            "type": kind,
            "log_entry": entry,
        });
        store.write(&self.table, &PrimaryKey::Explicit(key.clone()), &row)?;
        Ok(key)
    }
}
