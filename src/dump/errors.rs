//! Dump and load errors

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::engine::EngineError;
use crate::keys::KeyError;
use crate::record::CodecError;
use crate::table::TableError;

/// Result type for dump/load operations
pub type DumpResult<T> = Result<T, DumpError>;

/// Dump and load failures
#[derive(Debug, Error)]
pub enum DumpError {
    /// Reading or writing the dump file failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Separator is not a usable control character
    #[error("Dump separator {0:?} must be a control character other than CR or LF")]
    InvalidSeparator(char),

    /// A dump line could not be split or parsed
    #[error("Malformed dump line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    /// Key could not be built for `build_line`
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Record could not be converted between forms
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Stored record could not be read back
    #[error(transparent)]
    Table(#[from] TableError),

    /// Underlying engine failure
    #[error("{0}")]
    Engine(#[from] EngineError),
}

impl DumpError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        DumpError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        DumpError::MalformedLine {
            line,
            reason: reason.into(),
        }
    }
}
