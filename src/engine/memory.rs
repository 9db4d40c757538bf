//! Volatile in-memory engine

use std::collections::BTreeMap;
use std::ops::Bound;

use super::errors::EngineResult;
use super::{scan_index, Engine, EngineIter};

/// In-memory engine backed by a `BTreeMap`.
///
/// Flush and close are no-ops. Used for tests and for throwaway stores.
#[derive(Debug, Default, Clone)]
pub struct MemoryEngine {
    index: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the engine holds no entries
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl Engine for MemoryEngine {
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>> {
        Ok(self.index.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()> {
        self.index.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> EngineResult<bool> {
        Ok(self.index.remove(key).is_some())
    }

    fn contains(&self, key: &[u8]) -> EngineResult<bool> {
        Ok(self.index.contains_key(key))
    }

    fn range<'a>(&'a self, start: Bound<&[u8]>, end: Bound<&[u8]>) -> EngineResult<EngineIter<'a>> {
        Ok(scan_index(&self.index, start, end))
    }

    fn flush(&mut self) -> EngineResult<()> {
        Ok(())
    }

    fn close(&mut self) -> EngineResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(keys: &[&str]) -> MemoryEngine {
        let mut engine = MemoryEngine::new();
        for k in keys {
            engine.set(k.as_bytes(), k.as_bytes()).unwrap();
        }
        engine
    }

    #[test]
    fn test_set_get_delete() {
        let mut engine = MemoryEngine::new();
        engine.set(b"k", b"v1").unwrap();
        engine.set(b"k", b"v2").unwrap();
        assert_eq!(engine.get(b"k").unwrap(), Some(b"v2".to_vec()));
        assert!(engine.contains(b"k").unwrap());

        assert!(engine.delete(b"k").unwrap());
        assert!(!engine.delete(b"k").unwrap());
        assert_eq!(engine.get(b"k").unwrap(), None);
    }

    #[test]
    fn test_keys_half_open() {
        let engine = engine_with(&["a", "b", "c", "d"]);
        let keys: Vec<&[u8]> = engine.keys(b"b", b"d").unwrap().collect();
        assert_eq!(keys, vec![b"b".as_slice(), b"c".as_slice()]);
    }

    #[test]
    fn test_items_ascending() {
        let engine = engine_with(&["c", "a", "b"]);
        let keys: Vec<&[u8]> = engine.scan_all().unwrap().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"a".as_slice(), b"b".as_slice(), b"c".as_slice()]);
    }

    #[test]
    fn test_inverted_range_yields_nothing() {
        let engine = engine_with(&["a", "b"]);
        assert_eq!(engine.values(b"z", b"a").unwrap().count(), 0);
    }
}
