//! Command-line interface
//!
//! - serve: HTTP JSON-RPC gateway
//! - request: JSON-RPC over stdin/stdout
//! - dump / load: bulk export and import
//! - compact: shrink the data file

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{compact, dump, load, request, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
