//! CLI command implementations
//!
//! Every command boots the same way: load config, set the log threshold,
//! open the log engine at `data_path`, wrap it in a table store.

use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::json;

use crate::engine::{Engine, LogEngine};
use crate::http_server::HttpServer;
use crate::observability::{log_event, log_event_with_fields, Event, Logger};
use crate::rpc::RpcGateway;
use crate::table::TableStore;

use super::args::Command;
use super::config::Config;
use super::errors::{CliError, CliResult};
use super::io::{read_lines, write_json, write_value};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Request { config } => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            request(&config, stdin.lock(), &mut stdout)
        }
        Command::Dump { config, file } => dump(&config, file.as_deref()),
        Command::Load { config, file } => load(&config, file.as_deref()),
        Command::Compact { config } => compact(&config),
    }
}

fn load_config(config_path: &Path) -> CliResult<Config> {
    log_event(Event::BootStart);
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.log_severity()?);
    log_event_with_fields(Event::ConfigLoaded, &[("data_path", config.data_path.as_str())]);
    Ok(config)
}

fn open_store(config: &Config) -> CliResult<TableStore<LogEngine>> {
    let engine = LogEngine::open(config.data_path())
        .map_err(|e| CliError::boot_failed(format!("Failed to open {}: {}", config.data_path, e)))?;
    let store = TableStore::open(engine, config.store_options())
        .map_err(|e| CliError::boot_failed(e.to_string()))?;
    log_event(Event::BootComplete);
    Ok(store)
}

fn open_gateway(config: &Config) -> CliResult<RpcGateway<LogEngine>> {
    let store = open_store(config)?;
    Ok(RpcGateway::new(
        store,
        config.dump_format()?,
        config.default_dump_path(),
        config.gateway_config(),
    ))
}

/// Serve the gateway over HTTP until interrupted
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.http.port = port;
    }

    let gateway = open_gateway(&config)?;
    let server = HttpServer::new(config.http.clone(), gateway);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Answer one JSON-RPC request per input line until EOF.
///
/// Blank lines are skipped; every other line gets exactly one reply line,
/// including malformed ones.
pub fn request<R: BufRead, W: Write>(config_path: &Path, input: R, output: &mut W) -> CliResult<()> {
    let config = load_config(config_path)?;
    let mut gateway = open_gateway(&config)?;

    for line in read_lines(input) {
        let reply = gateway.handle(&line?);
        write_json(output, &reply.to_json())?;
    }

    gateway.store_mut().close()?;
    log_event(Event::ShutdownComplete);
    Ok(())
}

/// Export every record
pub fn dump(config_path: &Path, file: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let format = config.dump_format()?;
    let mut store = open_store(&config)?;

    let path = file.map(Path::to_path_buf).unwrap_or_else(|| config.default_dump_path());
    let written = format.dump_all(&store, &path)?;
    store.close()?;

    write_value(&json!({"path": path.display().to_string(), "records": written}))
}

/// Import a dump file.
///
/// Unlike the RPC method this is never gated: the operator running the
/// command already has the data file.
pub fn load(config_path: &Path, file: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let format = config.dump_format()?;
    let mut store = open_store(&config)?;

    let path = file.map(Path::to_path_buf).unwrap_or_else(|| config.default_dump_path());
    let applied = format.load(&mut store, &path)?;
    store.close()?;

    write_value(&json!({"path": path.display().to_string(), "records": applied}))
}

/// Rewrite the data file to live records only
pub fn compact(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let mut engine = LogEngine::open(config.data_path())
        .map_err(|e| CliError::boot_failed(format!("Failed to open {}: {}", config.data_path, e)))?;
    engine.compact()?;
    let live = engine.len();
    engine.close()?;

    write_value(&json!({"path": config.data_path, "records": live}))
}
