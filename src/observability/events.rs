//! Observable events
//!
//! Events are explicit and typed; the logger only ever sees their names.

use std::fmt;

/// Observable events in the store and its gateways
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Process startup begins
    BootStart,
    /// Startup complete
    BootComplete,
    /// Configuration file loaded and validated
    ConfigLoaded,
    /// Shutdown complete
    ShutdownComplete,

    // Engine
    /// Log replay finished
    EngineReplayed,
    /// Log rewritten to live entries only
    EngineCompacted,
    /// Log contains an unreadable record (FATAL)
    EngineCorruption,
    /// Failed append discarded, file cut back to its durable length
    EngineRolledBack,
    /// Failed append could not be cut back (FATAL)
    EngineFailed,

    // Store
    /// Table store constructed over an engine
    StoreOpened,
    /// Table store closed
    StoreClosed,

    // Dump / load
    /// Dump started
    DumpStart,
    /// Dump complete
    DumpComplete,
    /// Load started
    LoadStart,
    /// Load complete
    LoadComplete,

    // Gateway
    /// Request dispatched to the store
    RpcRequest,
    /// Request refused before reaching the store
    RpcRejected,
    /// Store operation failed
    RpcFailed,

    // Server
    /// HTTP listener bound, ready for requests
    Serving,
}

impl Event {
    /// Returns the event name as used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "BOOT_START",
            Event::BootComplete => "BOOT_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::EngineReplayed => "ENGINE_REPLAYED",
            Event::EngineCompacted => "ENGINE_COMPACTED",
            Event::EngineCorruption => "ENGINE_CORRUPTION",
            Event::EngineRolledBack => "ENGINE_ROLLED_BACK",
            Event::EngineFailed => "ENGINE_FAILED",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreClosed => "STORE_CLOSED",
            Event::DumpStart => "DUMP_START",
            Event::DumpComplete => "DUMP_COMPLETE",
            Event::LoadStart => "LOAD_START",
            Event::LoadComplete => "LOAD_COMPLETE",
            Event::RpcRequest => "RPC_REQUEST",
            Event::RpcRejected => "RPC_REJECTED",
            Event::RpcFailed => "RPC_FAILED",
            Event::Serving => "SERVING",
        }
    }

    /// Whether this event means the process cannot continue
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::EngineCorruption | Event::EngineFailed)
    }

    /// Whether this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::EngineRolledBack | Event::RpcRejected | Event::RpcFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
