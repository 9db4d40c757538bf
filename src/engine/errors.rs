//! Engine error types
//!
//! Error codes:
//! - ENGINE_IO_ERROR (ERROR severity)
//! - ENGINE_WRITE_FAILED (ERROR severity)
//! - ENGINE_CLOSED (ERROR severity)
//! - ENGINE_DATA_CORRUPTION (FATAL severity)
//! - ENGINE_FAILED (FATAL severity)

use std::fmt;
use std::io;

/// Severity levels for engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, server continues
    Error,
    /// The engine cannot be used until repaired
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Engine-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorCode {
    /// Disk I/O failure
    EngineIoError,
    /// Log append or flush failed
    EngineWriteFailed,
    /// Operation attempted after close
    EngineClosed,
    /// Log checksum or framing failure
    EngineDataCorruption,
    /// A failed append could not be rolled back; the engine refuses all use
    EngineFailed,
}

impl EngineErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            EngineErrorCode::EngineIoError => "ENGINE_IO_ERROR",
            EngineErrorCode::EngineWriteFailed => "ENGINE_WRITE_FAILED",
            EngineErrorCode::EngineClosed => "ENGINE_CLOSED",
            EngineErrorCode::EngineDataCorruption => "ENGINE_DATA_CORRUPTION",
            EngineErrorCode::EngineFailed => "ENGINE_FAILED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            EngineErrorCode::EngineIoError => Severity::Error,
            EngineErrorCode::EngineWriteFailed => Severity::Error,
            EngineErrorCode::EngineClosed => Severity::Error,
            EngineErrorCode::EngineDataCorruption => Severity::Fatal,
            EngineErrorCode::EngineFailed => Severity::Fatal,
        }
    }
}

impl fmt::Display for EngineErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Engine error with code, message and optional context
#[derive(Debug)]
pub struct EngineError {
    code: EngineErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl EngineError {
    /// Create a new engine I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: EngineErrorCode::EngineIoError,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new write failed error
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: EngineErrorCode::EngineWriteFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create an error for use after close
    pub fn closed() -> Self {
        Self {
            code: EngineErrorCode::EngineClosed,
            message: "Engine is closed".to_string(),
            details: None,
            source: None,
        }
    }

    /// Create an error for use after an unrecoverable append failure
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            code: EngineErrorCode::EngineFailed,
            message: "Engine failed and must be reopened".to_string(),
            details: Some(reason.into()),
            source: None,
        }
    }

    /// Create a data corruption error with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: EngineErrorCode::EngineDataCorruption,
            message: reason.into(),
            details: Some(format!("byte_offset: {}", offset)),
            source: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> EngineErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
