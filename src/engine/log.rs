//! File-backed engine: append-only log replayed into an ordered index
//!
//! - Every mutation is appended to the log as a checksummed record
//! - Appends are buffered until `flush`, which writes and fsyncs them
//! - On open the whole log is replayed; any checksum or framing failure
//!   aborts the open
//! - `compact` rewrites the live key set into a fresh log
//! - A failed append cuts the file back to its last durable length and
//!   drops the unflushed batch from the index

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::ops::Bound;
use std::path::{Path, PathBuf};

use crate::observability::{log_event_with_fields, Event};

use super::errors::{EngineError, EngineResult};
use super::record::{LogOp, LogRecord};
use super::{scan_index, Engine, EngineIter};

/// Append target of the log.
pub(crate) trait LogFile: Write + Send {
    /// Make everything written so far durable
    fn sync(&mut self) -> io::Result<()>;

    /// Cut the file back to `len` bytes
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Durable engine stored in a single log file.
pub struct LogEngine {
    /// Path to the log file
    path: PathBuf,
    /// Append handle; `None` once closed
    file: Option<Box<dyn LogFile>>,
    /// Length of the file up to the last successful flush
    durable_len: u64,
    /// Set when a failed append could not be rolled back
    failed: bool,
    /// Live view of the key space
    index: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Serialized records not yet written to the file
    pending: Vec<u8>,
    /// Previous index values of every key touched since the last flush
    undo: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

impl LogEngine {
    /// Opens or creates the log at `path` and replays it.
    ///
    /// # Errors
    ///
    /// Returns `ENGINE_WRITE_FAILED` if the file cannot be created or opened,
    /// `ENGINE_DATA_CORRUPTION` if any record fails verification.
    pub fn open(path: &Path) -> EngineResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    EngineError::write_failed(
                        format!("Failed to create directory: {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                EngineError::write_failed(format!("Failed to open log: {}", path.display()), e)
            })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| EngineError::io_error(format!("Failed to read log: {}", path.display()), e))?;

        let path_text = path.display().to_string();
        let index = Self::replay(&contents).map_err(|e| {
            let error = e.to_string();
            log_event_with_fields(
                Event::EngineCorruption,
                &[("error", error.as_str()), ("path", path_text.as_str())],
            );
            e
        })?;
        let bytes = contents.len().to_string();
        let entries = index.len().to_string();
        log_event_with_fields(
            Event::EngineReplayed,
            &[
                ("bytes", bytes.as_str()),
                ("entries", entries.as_str()),
                ("path", path_text.as_str()),
            ],
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(Box::new(file)),
            durable_len: contents.len() as u64,
            failed: false,
            index,
            pending: Vec::new(),
            undo: Vec::new(),
        })
    }

    /// Rebuilds the key space from raw log bytes.
    fn replay(contents: &[u8]) -> EngineResult<BTreeMap<Vec<u8>, Vec<u8>>> {
        let mut index = BTreeMap::new();
        let mut offset = 0usize;

        while offset < contents.len() {
            let (record, consumed) = LogRecord::deserialize(&contents[offset..])
                .map_err(|e| EngineError::corruption_at_offset(offset as u64, e.to_string()))?;

            match record.op {
                LogOp::Set => {
                    index.insert(record.key, record.value);
                }
                LogOp::Delete => {
                    index.remove(&record.key);
                }
            }
            offset += consumed;
        }

        Ok(index)
    }

    /// Returns the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the engine holds no live entries
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Rewrites the log so it holds exactly one set record per live key.
    ///
    /// The new log is written beside the old one, fsynced, then renamed over
    /// it. Pending writes are flushed first.
    pub fn compact(&mut self) -> EngineResult<()> {
        self.flush()?;

        let tmp_path = self.path.with_extension("compact");
        let mut buf = Vec::new();
        {
            let mut tmp = File::create(&tmp_path).map_err(|e| {
                EngineError::write_failed(
                    format!("Failed to create compaction file: {}", tmp_path.display()),
                    e,
                )
            })?;
            for (key, value) in &self.index {
                buf.extend_from_slice(&LogRecord::set(key, value).serialize());
            }
            tmp.write_all(&buf)
                .map_err(|e| EngineError::write_failed("Failed to write compacted log", e))?;
            tmp.sync_all()
                .map_err(|e| EngineError::write_failed("Failed to sync compacted log", e))?;
        }

        fs::rename(&tmp_path, &self.path)
            .map_err(|e| EngineError::write_failed("Failed to replace log", e))?;

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                EngineError::write_failed(format!("Failed to reopen log: {}", self.path.display()), e)
            })?;
        self.file = Some(Box::new(file));
        self.durable_len = buf.len() as u64;

        let entries = self.index.len().to_string();
        log_event_with_fields(Event::EngineCompacted, &[("entries", entries.as_str())]);
        Ok(())
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.failed {
            return Err(EngineError::failed("an earlier append could not be rolled back"));
        }
        if self.file.is_none() {
            return Err(EngineError::closed());
        }
        Ok(())
    }

    /// Discards the unflushed batch after a failed append.
    ///
    /// Index entries touched since the last flush get their previous values
    /// back and the file is cut to `durable_len`, so a torn tail never
    /// reaches replay. If the cut fails the engine refuses all further use.
    fn abort_pending(&mut self, cause: io::Error) -> EngineError {
        let discarded = self.undo.len().to_string();
        self.pending.clear();
        for (key, previous) in self.undo.drain(..).rev() {
            match previous {
                Some(value) => {
                    self.index.insert(key, value);
                }
                None => {
                    self.index.remove(&key);
                }
            }
        }

        let durable_len = self.durable_len;
        let cut = match self.file.as_mut() {
            Some(file) => file.truncate(durable_len).and_then(|()| file.sync()),
            None => Ok(()),
        };

        let cause_text = cause.to_string();
        match cut {
            Ok(()) => {
                log_event_with_fields(
                    Event::EngineRolledBack,
                    &[("discarded", discarded.as_str()), ("error", cause_text.as_str())],
                );
                EngineError::write_failed("Failed to append to log", cause)
            }
            Err(e) => {
                self.failed = true;
                let reason = format!("append failed: {}; truncate failed: {}", cause_text, e);
                log_event_with_fields(Event::EngineFailed, &[("error", reason.as_str())]);
                EngineError::failed(reason)
            }
        }
    }
}

impl Engine for LogEngine {
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.index.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.ensure_open()?;
        self.pending
            .extend_from_slice(&LogRecord::set(key, value).serialize());
        let previous = self.index.insert(key.to_vec(), value.to_vec());
        self.undo.push((key.to_vec(), previous));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> EngineResult<bool> {
        self.ensure_open()?;
        let previous = match self.index.remove(key) {
            Some(previous) => previous,
            None => return Ok(false),
        };
        self.pending
            .extend_from_slice(&LogRecord::delete(key).serialize());
        self.undo.push((key.to_vec(), Some(previous)));
        Ok(true)
    }

    fn contains(&self, key: &[u8]) -> EngineResult<bool> {
        self.ensure_open()?;
        Ok(self.index.contains_key(key))
    }

    fn range<'a>(&'a self, start: Bound<&[u8]>, end: Bound<&[u8]>) -> EngineResult<EngineIter<'a>> {
        self.ensure_open()?;
        Ok(scan_index(&self.index, start, end))
    }

    /// Writes and syncs the pending batch.
    ///
    /// On failure the whole batch is discarded: none of it is visible to
    /// reads and none of it survives reopen.
    fn flush(&mut self) -> EngineResult<()> {
        self.ensure_open()?;
        if self.pending.is_empty() {
            return Ok(());
        }

        let file = self.file.as_mut().ok_or_else(EngineError::closed)?;
        match file.write_all(&self.pending).and_then(|()| file.sync()) {
            Ok(()) => {
                self.durable_len += self.pending.len() as u64;
                self.pending.clear();
                self.undo.clear();
                Ok(())
            }
            Err(e) => Err(self.abort_pending(e)),
        }
    }

    fn close(&mut self) -> EngineResult<()> {
        if self.file.is_none() {
            return Ok(());
        }
        if self.failed {
            self.file = None;
            return Err(EngineError::failed("an earlier append could not be rolled back"));
        }
        self.flush()?;
        self.file = None;
        Ok(())
    }
}
