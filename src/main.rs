//! Command-line front end for the Thompson NFA matcher.
//!
//! Two mutually exclusive modes, both reading from standard input:
//!
//! - `-r`: read one pattern line, print its postfix rendering followed
//!   by a newline.
//! - `-t`: read the pattern from the first line, then emit one
//!   acceptance digit (`1` or `0`, no separator) per subsequent line,
//!   terminated by a single newline at end of input.
//!
//! Any other flag (or none) prints a usage line to standard error and
//! exits with status 1.  Lines are handled as raw bytes; only trailing
//! `\r`/`\n` are stripped.

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use anyhow::{Context, Result};

use regex_thompson_tabular::{Program, Regex};

/// Strip any trailing CR/LF bytes in place.
fn strip_line_ending(line: &mut Vec<u8>) {
    while matches!(line.last(), Some(b'\r' | b'\n')) {
        line.pop();
    }
}

/// Read one `\n`-terminated (or EOF-terminated) line of raw bytes, with
/// the line ending stripped.  Returns `None` at end of input.
fn read_line(reader: &mut impl BufRead) -> Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let n = reader
        .read_until(b'\n', &mut line)
        .context("failed to read from stdin")?;
    if n == 0 {
        return Ok(None);
    }
    strip_line_ending(&mut line);
    Ok(Some(line))
}

/// `-r`: echo the postfix form of one pattern read from `reader`.
///
/// Returns `false` if no pattern line was available.
fn render_postfix(reader: &mut impl BufRead, writer: &mut impl Write) -> Result<bool> {
    let Some(pattern) = read_line(reader)? else {
        return Ok(false);
    };
    let program = Program::parse(&pattern);
    writer
        .write_all(&program.postfix())
        .and_then(|_| writer.write_all(b"\n"))
        .and_then(|_| writer.flush())
        .context("failed to write to stdout")?;
    Ok(true)
}

/// `-t`: compile the first line, then emit one acceptance digit per
/// subsequent line and a final newline.
///
/// Returns `false` if no pattern line was available.
fn test_lines(reader: &mut impl BufRead, writer: &mut impl Write) -> Result<bool> {
    let Some(pattern) = read_line(reader)? else {
        return Ok(false);
    };
    let regex = Regex::new(&pattern);
    while let Some(line) = read_line(reader)? {
        let digit: &[u8] = if regex.is_match(&line) { b"1" } else { b"0" };
        writer.write_all(digit).context("failed to write to stdout")?;
    }
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .context("failed to write to stdout")?;
    Ok(true)
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let stdin = io::stdin();
    let stdout = io::stdout();

    let completed = match args.get(1).map(String::as_str) {
        Some("-r") => render_postfix(&mut stdin.lock(), &mut stdout.lock())?,
        Some("-t") => test_lines(&mut stdin.lock(), &mut stdout.lock())?,
        _ => {
            let name = args
                .first()
                .map(String::as_str)
                .unwrap_or(env!("CARGO_PKG_NAME"));
            eprintln!("Usage: {} -r | -t", name);
            process::exit(1);
        }
    };

    if !completed {
        // End of input before the pattern line.
        process::exit(1);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
