//! Line-oriented stdin/stdout handling
//!
//! - Input: one JSON-RPC request per line
//! - Output: one JSON object per line
//! - UTF-8 only

use std::io::{self, BufRead, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Reads request lines from `reader`, skipping blank ones.
///
/// Lines are returned raw so that malformed JSON is answered with a parse
/// error reply rather than ending the session.
pub fn read_lines<R: BufRead>(reader: R) -> impl Iterator<Item = CliResult<String>> {
    reader
        .lines()
        .map(|line| line.map_err(CliError::from))
        .filter(|line| !matches!(line, Ok(text) if text.trim().is_empty()))
}

/// Write a raw JSON string as one line
pub fn write_json<W: Write>(writer: &mut W, json_str: &str) -> CliResult<()> {
    writeln!(writer, "{}", json_str)?;
    writer.flush()?;
    Ok(())
}

/// Write a JSON value to stdout as one line
pub fn write_value(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_lines_skips_blank() {
        let input = Cursor::new("{\"a\":1}\n\n   \nnot json\n");
        let lines: Vec<String> = read_lines(input).map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["{\"a\":1}", "not json"]);
    }

    #[test]
    fn test_write_json_appends_newline() {
        let mut out = Vec::new();
        write_json(&mut out, "{}").unwrap();
        assert_eq!(out, b"{}\n");
    }
}
