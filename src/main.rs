//! tablestore CLI entry point
//!
//! Parsing, boot and dispatch all live in the CLI module. This file only
//! reports the error and sets the exit code.

use tablestore::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
