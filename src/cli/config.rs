//! Configuration file
//!
//! A JSON object; only `data_path` is required:
//!
//! ```json
//! {
//!   "data_path": "/var/lib/tablestore/simple.db",
//!   "record_codec": "binary",
//!   "read_only": true,
//!   "port": 8080
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dump::{default_dump_path, DumpFormat, DEFAULT_DUMP_SEPARATOR};
use crate::http_server::HttpServerConfig;
use crate::keys::{KeyCodec, DEFAULT_SEPARATOR};
use crate::observability::Severity;
use crate::record::CodecKind;
use crate::rpc::{Ceilings, GatewayConfig};
use crate::table::{CommitMode, StoreOptions};

use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data file of the log engine (required)
    pub data_path: String,

    /// Separator between table name and key components (default ".")
    #[serde(default = "default_key_separator")]
    pub key_separator: char,

    /// Separator between key and record in dump files (default TAB)
    #[serde(default = "default_dump_separator")]
    pub dump_separator: char,

    /// Record codec: "json" or "binary" (default "json")
    #[serde(default)]
    pub record_codec: CodecKind,

    /// Flush after every mutation (default true)
    #[serde(default = "default_auto_commit")]
    pub auto_commit: bool,

    /// Refuse mutating RPC methods (default false)
    #[serde(default)]
    pub read_only: bool,

    /// Expose `load` over RPC (default false)
    #[serde(default)]
    pub allow_load: bool,

    /// Result size ceilings of the range methods
    #[serde(default)]
    pub ceilings: Ceilings,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// HTTP listener
    #[serde(flatten)]
    pub http: HttpServerConfig,
}

fn default_key_separator() -> char {
    DEFAULT_SEPARATOR
}

fn default_dump_separator() -> char {
    DEFAULT_DUMP_SEPARATOR
}

fn default_auto_commit() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        Self::parse(&content)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_path.trim().is_empty() {
            return Err(CliError::config_error("data_path must not be empty"));
        }

        KeyCodec::new(self.key_separator)
            .map_err(|e| CliError::config_error(format!("key_separator: {}", e)))?;

        DumpFormat::new(self.dump_separator)
            .map_err(|e| CliError::config_error(format!("dump_separator: {}", e)))?;

        self.log_severity()?;

        let Ceilings {
            table_keys,
            table_rows,
            table_items,
        } = self.ceilings;
        if table_keys == 0 || table_rows == 0 || table_items == 0 {
            return Err(CliError::config_error("ceilings must be > 0"));
        }

        Ok(())
    }

    /// Data file path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_path)
    }

    /// Dump file used when none is given
    pub fn default_dump_path(&self) -> PathBuf {
        default_dump_path(self.data_path())
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("log_level: {}", e)))
    }

    /// Table store options
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            key_separator: self.key_separator,
            codec: self.record_codec,
            commit_mode: if self.auto_commit {
                CommitMode::Auto
            } else {
                CommitMode::Manual
            },
        }
    }

    /// Dump format
    pub fn dump_format(&self) -> CliResult<DumpFormat> {
        DumpFormat::new(self.dump_separator)
            .map_err(|e| CliError::config_error(format!("dump_separator: {}", e)))
    }

    /// Gateway policy
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            read_only: self.read_only,
            allow_load: self.allow_load,
            ceilings: self.ceilings,
        }
    }
}
