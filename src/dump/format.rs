//! Line-oriented interchange format
//!
//! ```text
//! <engine key text><SEP><canonical record text>\n
//! ```
//!
//! SEP is a control character. Canonical record text escapes every control
//! character and keys reject them, so the first SEP on a line always splits
//! key from record.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::engine::Engine;
use crate::keys::{KeyCodec, KeyError, PrimaryKey};
use crate::observability::{log_event_with_fields, Event};
use crate::record::{canonical_text, parse_canonical};
use crate::table::{TableError, TableStore};

use super::errors::{DumpError, DumpResult};

/// Default line separator
pub const DEFAULT_DUMP_SEPARATOR: char = '\t';

/// Suffix appended to the data path to form the default dump file
pub const DUMP_SUFFIX: &str = ".dump.txt";

/// Dump file used when no explicit path is given: `<data path>.dump.txt`.
pub fn default_dump_path(data_path: &Path) -> PathBuf {
    let mut name = OsString::from(data_path.as_os_str());
    name.push(DUMP_SUFFIX);
    PathBuf::from(name)
}

/// Dump/load with a fixed key/record separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpFormat {
    separator: char,
}

impl Default for DumpFormat {
    fn default() -> Self {
        Self {
            separator: DEFAULT_DUMP_SEPARATOR,
        }
    }
}

impl DumpFormat {
    /// Create a format using `separator` between key and record.
    pub fn new(separator: char) -> DumpResult<Self> {
        if !separator.is_control() || separator == '\n' || separator == '\r' {
            return Err(DumpError::InvalidSeparator(separator));
        }
        Ok(Self { separator })
    }

    /// The key/record separator
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Renders one dump line for `record` without touching any engine.
    pub fn build_line(
        &self,
        keys: &KeyCodec,
        table: &str,
        pk: &PrimaryKey,
        record: &Value,
    ) -> DumpResult<String> {
        let db_key = keys.derive_key(table, pk, record)?;
        let key = String::from_utf8(db_key)
            .map_err(|e| KeyError::NotUtf8(String::from_utf8_lossy(e.as_bytes()).into_owned()))?;
        Ok(self.render(&key, record))
    }

    /// Splits a line (without its terminator) into key text and record text.
    pub fn split_line<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        line.split_once(self.separator)
    }

    fn render(&self, key: &str, record: &Value) -> String {
        format!("{}{}{}\n", key, self.separator, canonical_text(record))
    }

    /// Writes every stored entry to `path` in ascending key order.
    ///
    /// Records are always written as canonical text, whatever codec the store
    /// uses. Returns the number of lines written.
    pub fn dump_all<E: Engine>(&self, store: &TableStore<E>, path: &Path) -> DumpResult<usize> {
        let path_text = path.display().to_string();
        log_event_with_fields(Event::DumpStart, &[("path", path_text.as_str())]);

        let file = File::create(path).map_err(|e| DumpError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        let mut written = 0usize;

        for (db_key, bytes) in store.engine().scan_all()? {
            let key = std::str::from_utf8(db_key)
                .map_err(|_| KeyError::NotUtf8(String::from_utf8_lossy(db_key).into_owned()))?;
            let record = store
                .record_codec()
                .decode(bytes)
                .map_err(|source| TableError::Corrupt {
                    key: key.to_string(),
                    source,
                })?;
            writer
                .write_all(self.render(key, &record).as_bytes())
                .map_err(|e| DumpError::io(path, e))?;
            written += 1;
        }

        let file = writer
            .into_inner()
            .map_err(|e| DumpError::io(path, e.into_error()))?;
        file.sync_all().map_err(|e| DumpError::io(path, e))?;

        let records = written.to_string();
        log_event_with_fields(
            Event::DumpComplete,
            &[("path", path_text.as_str()), ("records", records.as_str())],
        );
        Ok(written)
    }

    /// Upserts every line of `path` into the store.
    ///
    /// Keys are written verbatim. Each record is re-encoded with the store's
    /// codec and flushed before the next line is read. Blank lines are
    /// skipped. Returns the number of records applied.
    pub fn load<E: Engine>(&self, store: &mut TableStore<E>, path: &Path) -> DumpResult<usize> {
        let path_text = path.display().to_string();
        log_event_with_fields(Event::LoadStart, &[("path", path_text.as_str())]);

        let file = File::open(path).map_err(|e| DumpError::io(path, e))?;
        let reader = BufReader::new(file);
        let mut applied = 0usize;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|e| DumpError::io(path, e))?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let (key, text) = self
                .split_line(line)
                .ok_or_else(|| DumpError::malformed(line_no, "missing separator"))?;
            if key.is_empty() {
                return Err(DumpError::malformed(line_no, "empty key"));
            }
            let record =
                parse_canonical(text).map_err(|e| DumpError::malformed(line_no, e.to_string()))?;

            let bytes = store.record_codec().encode(&record)?;
            let engine = store.engine_mut();
            engine.set(key.as_bytes(), &bytes)?;
            engine.flush()?;
            applied += 1;
        }

        let records = applied.to_string();
        log_event_with_fields(
            Event::LoadComplete,
            &[("path", path_text.as_str()), ("records", records.as_str())],
        );
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::keys::{FieldId, Key};
    use crate::record::CodecKind;
    use crate::table::{CommitMode, ScanRange, StoreOptions};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn store(codec: CodecKind) -> TableStore<MemoryEngine> {
        TableStore::open(
            MemoryEngine::new(),
            StoreOptions {
                codec,
                ..StoreOptions::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_separator_validation() {
        assert!(DumpFormat::new('\t').is_ok());
        assert!(DumpFormat::new('\u{1f}').is_ok());
        assert!(DumpFormat::new('~').is_err());
        assert!(DumpFormat::new('\n').is_err());
        assert!(DumpFormat::new('\r').is_err());
    }

    #[test]
    fn test_default_dump_path() {
        assert_eq!(
            default_dump_path(Path::new("/data/simple.db")),
            PathBuf::from("/data/simple.db.dump.txt")
        );
    }

    #[test]
    fn test_build_line() {
        let line = DumpFormat::default()
            .build_line(
                &KeyCodec::default(),
                "customer",
                &PrimaryKey::Field(FieldId::from("customer_number")),
                &json!({"customer_number": "000100", "name": "Curt"}),
            )
            .unwrap();
        assert_eq!(line, "customer.000100\t{\"customer_number\":\"000100\",\"name\":\"Curt\"}\n");
    }

    #[test]
    fn test_split_line_uses_first_separator() {
        let format = DumpFormat::default();
        assert_eq!(format.split_line("t.1\t{\"a\":1}"), Some(("t.1", "{\"a\":1}")));
        assert_eq!(format.split_line("no separator"), None);
    }

    #[test]
    fn test_dump_is_codec_independent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.txt");
        let pk = PrimaryKey::Field(FieldId::from("id"));

        let mut binary = store(CodecKind::Binary);
        binary.write("t", &pk, &json!({"id": "1", "note": "tab\there"})).unwrap();
        assert_eq!(DumpFormat::default().dump_all(&binary, &path).unwrap(), 1);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "t.1\t{\"id\":\"1\",\"note\":\"tab\\there\"}\n");

        let mut json_store = store(CodecKind::Json);
        assert_eq!(DumpFormat::default().load(&mut json_store, &path).unwrap(), 1);
        assert_eq!(
            json_store.read("t", &Key::single("1")).unwrap(),
            Some(json!({"id": "1", "note": "tab\there"}))
        );
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.txt");
        fs::write(&path, "a.1\t{\"v\":1}\n\n   \r\na.2\t[1,2]\r\n").unwrap();

        let mut store = store(CodecKind::Json);
        assert_eq!(DumpFormat::default().load(&mut store, &path).unwrap(), 2);
        assert_eq!(store.table_keys("a", &ScanRange::all()).unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn test_load_reports_line_number() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.txt");
        fs::write(&path, "a.1\t{\"v\":1}\na.2 {\"v\":2}\n").unwrap();

        let mut store = store(CodecKind::Json);
        let err = DumpFormat::default().load(&mut store, &path).unwrap_err();
        assert!(matches!(err, DumpError::MalformedLine { line: 2, .. }));
        // Lines before the failure are already applied
        assert!(store.exists("a", &Key::single("1")).unwrap());
    }

    #[test]
    fn test_load_rejects_bad_record_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.txt");
        fs::write(&path, "a.1\t{broken\n").unwrap();

        let mut store = store(CodecKind::Json);
        let err = DumpFormat::default().load(&mut store, &path).unwrap_err();
        assert!(matches!(err, DumpError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut store = store(CodecKind::Json);
        let err = DumpFormat::default()
            .load(&mut store, &dir.path().join("absent.txt"))
            .unwrap_err();
        assert!(matches!(err, DumpError::Io { .. }));
    }

    #[test]
    fn test_custom_separator_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.txt");
        let format = DumpFormat::new('\u{1e}').unwrap();

        let mut source = TableStore::open(
            MemoryEngine::new(),
            StoreOptions {
                commit_mode: CommitMode::Manual,
                ..StoreOptions::default()
            },
        )
        .unwrap();
        source
            .write("t", &PrimaryKey::Explicit(Key::composite(["a", "b"])), &json!({"x": null}))
            .unwrap();
        format.dump_all(&source, &path).unwrap();

        let mut target = store(CodecKind::Binary);
        format.load(&mut target, &path).unwrap();
        assert_eq!(
            target.table_items("t", &ScanRange::all()).unwrap(),
            vec![("a.b".to_string(), json!({"x": null}))]
        );
    }
}
