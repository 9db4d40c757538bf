//! Bulk export and import
//!
//! `dump_all` writes every entry of the engine as one text line;
//! `load` upserts such lines back, committing each line before reading the
//! next.

mod errors;
mod format;

pub use errors::{DumpError, DumpResult};
pub use format::{default_dump_path, DumpFormat, DEFAULT_DUMP_SEPARATOR, DUMP_SUFFIX};
