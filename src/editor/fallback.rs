//! Degraded-mode line reading for pipes, files and unsupported terminals.
//!
//! Reads up to the next newline without touching terminal attributes, and
//! reports end-of-input distinctly from an empty line.

use crate::editor::ReadOutcome;
use std::io::{self, BufRead, Write};

/// Read one newline-terminated line from `input`.
///
/// Returns [`ReadOutcome::Eof`] only when the stream is exhausted with
/// nothing read; a final unterminated line is still returned as a line.
pub fn read_line<R: BufRead>(input: &mut R) -> io::Result<ReadOutcome> {
    let mut raw = Vec::new();
    if input.read_until(b'\n', &mut raw)? == 0 {
        return Ok(ReadOutcome::Eof);
    }
    if raw.last() == Some(&b'\n') {
        raw.pop();
    }
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    Ok(ReadOutcome::Line(String::from_utf8_lossy(&raw).into_owned()))
}

/// Prompt on `output`, then read a line with the terminal's own line
/// discipline doing the editing.
pub fn read_line_with_prompt<R, W>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<ReadOutcome>
where
    R: BufRead,
    W: Write,
{
    output.write_all(prompt.as_bytes())?;
    output.flush()?;
    let outcome = read_line(input)?;
    if outcome == ReadOutcome::Eof {
        // Keep the caller's next output off the prompt row.
        output.write_all(b"\n")?;
        output.flush()?;
    }
    Ok(outcome)
}
