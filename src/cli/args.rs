//! CLI argument definitions using clap
//!
//! Commands:
//! - tablestore serve --config <path> [--port <port>]
//! - tablestore request --config <path>
//! - tablestore dump --config <path> [--file <path>]
//! - tablestore load --config <path> [--file <path>]
//! - tablestore compact --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Multi-table record store with a JSON-RPC gateway
#[derive(Parser, Debug)]
#[command(name = "tablestore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON-RPC gateway over HTTP
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./tablestore.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Answer JSON-RPC requests read line by line from stdin
    Request {
        /// Path to configuration file
        #[arg(long, default_value = "./tablestore.json")]
        config: PathBuf,
    },

    /// Export every record to a dump file
    Dump {
        /// Path to configuration file
        #[arg(long, default_value = "./tablestore.json")]
        config: PathBuf,

        /// Dump file (default: <data_path>.dump.txt)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Import a dump file
    Load {
        /// Path to configuration file
        #[arg(long, default_value = "./tablestore.json")]
        config: PathBuf,

        /// Dump file (default: <data_path>.dump.txt)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Rewrite the data file to live records only
    Compact {
        /// Path to configuration file
        #[arg(long, default_value = "./tablestore.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_port() {
        let cli = Cli::try_parse_from(["tablestore", "serve", "--config", "c.json", "--port", "9000"]).unwrap();
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from("c.json"));
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["tablestore", "compact"]).unwrap();
        match cli.command {
            Command::Compact { config } => assert_eq!(config, PathBuf::from("./tablestore.json")),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
