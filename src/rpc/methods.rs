//! Method registry and access policy
//!
//! The set of callable operations is closed: a wire name either maps to a
//! `Method` variant or the request is refused.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operations reachable over the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Write,
    Rewrite,
    Exists,
    Read,
    ReadColumns,
    First,
    Next,
    GetTableKeys,
    GetTableRows,
    GetTableItems,
    Delete,
    Commit,
    DumpAll,
    Load,
}

impl Method {
    /// Every method, in registry order
    pub const ALL: [Method; 14] = [
        Method::Write,
        Method::Rewrite,
        Method::Exists,
        Method::Read,
        Method::ReadColumns,
        Method::First,
        Method::Next,
        Method::GetTableKeys,
        Method::GetTableRows,
        Method::GetTableItems,
        Method::Delete,
        Method::Commit,
        Method::DumpAll,
        Method::Load,
    ];

    /// Resolves a wire name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Write => "write",
            Method::Rewrite => "rewrite",
            Method::Exists => "exists",
            Method::Read => "read",
            Method::ReadColumns => "readColumns",
            Method::First => "first",
            Method::Next => "next",
            Method::GetTableKeys => "getTableKeys",
            Method::GetTableRows => "getTableRows",
            Method::GetTableItems => "getTableItems",
            Method::Delete => "delete",
            Method::Commit => "commit",
            Method::DumpAll => "dumpAll",
            Method::Load => "load",
        }
    }

    /// Whether the method changes stored data
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Method::Write | Method::Rewrite | Method::Delete | Method::Load
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_table_keys() -> usize {
    500
}

fn default_table_rows() -> usize {
    200
}

fn default_table_items() -> usize {
    100
}

/// Maximum result sizes for the range methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ceilings {
    #[serde(default = "default_table_keys")]
    pub table_keys: usize,
    #[serde(default = "default_table_rows")]
    pub table_rows: usize,
    #[serde(default = "default_table_items")]
    pub table_items: usize,
}

impl Default for Ceilings {
    fn default() -> Self {
        Self {
            table_keys: default_table_keys(),
            table_rows: default_table_rows(),
            table_items: default_table_items(),
        }
    }
}

impl Ceilings {
    /// Ceiling for `method`, if it has one
    pub fn for_method(&self, method: Method) -> Option<usize> {
        match method {
            Method::GetTableKeys => Some(self.table_keys),
            Method::GetTableRows => Some(self.table_rows),
            Method::GetTableItems => Some(self.table_items),
            _ => None,
        }
    }
}

/// Which methods a deployment exposes, and how large their results may be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GatewayConfig {
    /// Refuse every mutating method
    pub read_only: bool,
    /// Expose `load`. Off by default: bulk import of caller-supplied files.
    pub allow_load: bool,
    pub ceilings: Ceilings,
}

impl GatewayConfig {
    /// Whether `method` may be called
    pub fn is_allowed(&self, method: Method) -> bool {
        match method {
            Method::Load => self.allow_load && !self.read_only,
            m if m.is_mutating() => !self.read_only,
            _ => true,
        }
    }
}
