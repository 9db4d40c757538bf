//! Ordered key-value engine
//!
//! The table store sits on top of a single flat, byte-ordered key space. This
//! module defines the contract that key space must satisfy and ships two
//! implementations of it.
//!
//! # Contract
//!
//! - get / set / delete by byte key
//! - ascending range iteration over keys, values or items
//! - membership test
//! - flush (durability point) and close
//!
//! Writes are visible to reads immediately; they are only durable after
//! `flush`.

mod checksum;
mod errors;
mod log;
mod memory;
mod record;

pub use checksum::compute_checksum;
pub use errors::{EngineError, EngineErrorCode, EngineResult, Severity};
pub use log::LogEngine;
pub use memory::MemoryEngine;
pub use record::{LogOp, LogRecord};

use std::collections::BTreeMap;
use std::ops::Bound;

/// Ascending iterator over `(key, value)` pairs borrowed from an engine
pub type EngineIter<'a> = Box<dyn Iterator<Item = (&'a [u8], &'a [u8])> + 'a>;

/// An ordered, byte-keyed key-value engine.
pub trait Engine {
    /// Returns the value stored under `key`.
    fn get(&self, key: &[u8]) -> EngineResult<Option<Vec<u8>>>;

    /// Inserts or replaces the value stored under `key`.
    fn set(&mut self, key: &[u8], value: &[u8]) -> EngineResult<()>;

    /// Removes `key`. Returns whether it was present.
    fn delete(&mut self, key: &[u8]) -> EngineResult<bool>;

    /// Returns whether `key` is present.
    fn contains(&self, key: &[u8]) -> EngineResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Iterates entries between `start` and `end` in ascending key order.
    ///
    /// An empty or inverted range yields nothing.
    fn range<'a>(&'a self, start: Bound<&[u8]>, end: Bound<&[u8]>) -> EngineResult<EngineIter<'a>>;

    /// Keys in `[low, high)`.
    fn keys<'a>(
        &'a self,
        low: &[u8],
        high: &[u8],
    ) -> EngineResult<Box<dyn Iterator<Item = &'a [u8]> + 'a>> {
        let iter = self.range(Bound::Included(low), Bound::Excluded(high))?;
        Ok(Box::new(iter.map(|(k, _)| k)))
    }

    /// Values in `[low, high)`.
    fn values<'a>(
        &'a self,
        low: &[u8],
        high: &[u8],
    ) -> EngineResult<Box<dyn Iterator<Item = &'a [u8]> + 'a>> {
        let iter = self.range(Bound::Included(low), Bound::Excluded(high))?;
        Ok(Box::new(iter.map(|(_, v)| v)))
    }

    /// Items in `[low, high)`.
    fn items<'a>(&'a self, low: &[u8], high: &[u8]) -> EngineResult<EngineIter<'a>> {
        self.range(Bound::Included(low), Bound::Excluded(high))
    }

    /// Every entry in the engine, in ascending key order.
    fn scan_all<'a>(&'a self) -> EngineResult<EngineIter<'a>> {
        self.range(Bound::Unbounded, Bound::Unbounded)
    }

    /// Makes all previous writes durable.
    fn flush(&mut self) -> EngineResult<()>;

    /// Flushes and releases the engine. Further calls fail.
    fn close(&mut self) -> EngineResult<()>;
}

/// Whether a bounded range can contain no key at all.
///
/// `BTreeMap::range` panics on inverted ranges, so every scan goes through
/// this check first.
pub(crate) fn is_empty_range(start: Bound<&[u8]>, end: Bound<&[u8]>) -> bool {
    let (s, start_inclusive) = match start {
        Bound::Included(s) => (s, true),
        Bound::Excluded(s) => (s, false),
        Bound::Unbounded => return false,
    };
    let (e, end_inclusive) = match end {
        Bound::Included(e) => (e, true),
        Bound::Excluded(e) => (e, false),
        Bound::Unbounded => return false,
    };
    s > e || (s == e && !(start_inclusive && end_inclusive))
}

/// Range scan over an ordered in-memory index.
pub(crate) fn scan_index<'a>(
    index: &'a BTreeMap<Vec<u8>, Vec<u8>>,
    start: Bound<&[u8]>,
    end: Bound<&[u8]>,
) -> EngineIter<'a> {
    if is_empty_range(start, end) {
        return Box::new(std::iter::empty());
    }
    Box::new(
        index
            .range::<[u8], _>((start, end))
            .map(|(k, v)| (k.as_slice(), v.as_slice())),
    )
}
