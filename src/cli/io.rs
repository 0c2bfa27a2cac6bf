//! JSON-lines I/O for the CLI
//!
//! - Input: one JSON request per line
//! - Output: one JSON response per line
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Non-blank input lines
pub fn read_lines<R: BufRead>(input: R) -> impl Iterator<Item = CliResult<String>> {
    input
        .lines()
        .map(|line| line.map_err(CliError::from))
        .filter(|line| !matches!(line, Ok(text) if text.trim().is_empty()))
}

/// `{"status":"ok","data":...}`
pub fn ok_response(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

/// `{"status":"error","code":...,"messages":[...]}`
pub fn error_response(code: &str, messages: &[String]) -> Value {
    json!({
        "status": "error",
        "code": code,
        "messages": messages
    })
}

/// Write one response line and flush
pub fn write_line<W: Write>(output: &mut W, response: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *output, response)?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_blank_lines_skipped() {
        let input = Cursor::new("{\"op\":\"find\"}\n\n   \n{\"op\":\"fetch\"}\n");
        let lines: Vec<String> = read_lines(input).map(Result::unwrap).collect();
        assert_eq!(lines, vec!["{\"op\":\"find\"}", "{\"op\":\"fetch\"}"]);
    }

    #[test]
    fn test_write_line() {
        let mut out = Vec::new();
        write_line(&mut out, &error_response("CAMPUS_NOT_FOUND", &["gone".to_string()])).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));

        let parsed: Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["messages"][0], "gone");
    }
}
