//! Terminal capability probing: escape-sequence support and screen width.
//!
//! Width comes from the `TIOCGWINSZ` ioctl when the OS knows it. Otherwise the
//! terminal itself is asked through the cursor-position report protocol:
//! request `ESC [ 6 n`, response `ESC [ rows ; cols R`.

use crate::error::TermError;
use crate::terminal::fd::{FdReader, FdWriter};
use crossterm::cursor::{MoveLeft, MoveRight};
use crossterm::QueueableCommand;
use std::io::{Read, Write};
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Width assumed when neither the OS nor the terminal can tell us.
pub const DEFAULT_COLUMNS: usize = 80;

/// Upper bound on bytes read while waiting for a cursor-position report.
pub const MAX_CURSOR_RESPONSE_LEN: usize = 32;

/// Terminal types known not to handle the escape-sequence protocol.
pub const UNSUPPORTED_TERMS: [&str; 3] = ["dumb", "cons25", "emacs"];

/// Cursor-position request (`DSR 6`).
pub const CURSOR_POSITION_REQUEST: &[u8] = b"\x1b[6n";

/// Report whether terminal type `term_name` can be driven in raw mode, using
/// the built-in denylist.
pub fn supports_raw_mode(term_name: &str) -> bool {
    supports_raw_mode_with(term_name, &UNSUPPORTED_TERMS)
}

/// Report whether `term_name` is absent from `denylist` (case-insensitive).
pub fn supports_raw_mode_with<S: AsRef<str>>(term_name: &str, denylist: &[S]) -> bool {
    !denylist
        .iter()
        .any(|unsupported| unsupported.as_ref().eq_ignore_ascii_case(term_name.trim()))
}

/// Options for the escape-sequence fallback of [`query_columns`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Width returned when every method fails.
    pub default_columns: usize,
    /// Bounded wait per response byte; `None` blocks indefinitely.
    pub response_timeout: Option<Duration>,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            default_columns: DEFAULT_COLUMNS,
            response_timeout: Some(Duration::from_millis(500)),
        }
    }
}

/// Determine the terminal width in columns.
///
/// Must only be called while no user keystrokes can be interleaved with the
/// terminal's answer, i.e. right after entering raw mode.
pub fn query_columns(input_fd: RawFd, output_fd: RawFd, options: ProbeOptions) -> usize {
    if let Some(cols) = window_columns(output_fd) {
        return cols;
    }
    let mut input = FdReader::with_timeout(input_fd, options.response_timeout);
    let mut output = FdWriter::new(output_fd);
    match columns_via_cursor(&mut input, &mut output) {
        Ok(cols) => cols,
        Err(e) => {
            tracing::warn!(error = %e, default = options.default_columns, "column probe failed");
            options.default_columns
        }
    }
}

/// Ask the OS for the window width of `fd`. `None` when unknown or zero.
pub fn window_columns(fd: RawFd) -> Option<usize> {
    // SAFETY: winsize is plain data and TIOCGWINSZ only fills it in.
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut ws) };
    if rc == -1 || ws.ws_col == 0 {
        return None;
    }
    Some(usize::from(ws.ws_col))
}

/// Measure the width by moving the cursor to the right margin and reading
/// back its column, then move it back where it was.
pub fn columns_via_cursor<R, W>(input: &mut R, output: &mut W) -> Result<usize, TermError>
where
    R: Read,
    W: Write,
{
    let (_, start) = cursor_position(input, output)?;

    // Column 999 gets clamped to the real right margin by the terminal.
    output.queue(MoveRight(999))?;
    output.flush()?;
    let (_, cols) = cursor_position(input, output)?;

    if cols > start {
        let distance = u16::try_from(cols - start).unwrap_or(u16::MAX);
        output.queue(MoveLeft(distance))?;
        output.flush()?;
    }
    Ok(cols)
}

/// Send a cursor-position request and parse the `(row, column)` answer.
pub fn cursor_position<R, W>(input: &mut R, output: &mut W) -> Result<(usize, usize), TermError>
where
    R: Read,
    W: Write,
{
    output.write_all(CURSOR_POSITION_REQUEST)?;
    output.flush()?;
    let response = read_cursor_response(input)?;
    parse_cursor_response(&response)
}

/// Read a report byte-by-byte until `R` or [`MAX_CURSOR_RESPONSE_LEN`] bytes.
///
/// Never consumes more than the cap, so keystrokes queued behind an unframed
/// answer are not eaten beyond it.
pub fn read_cursor_response<R: Read>(input: &mut R) -> Result<Vec<u8>, TermError> {
    let mut response = Vec::with_capacity(MAX_CURSOR_RESPONSE_LEN);
    let mut byte = [0u8; 1];
    while response.len() < MAX_CURSOR_RESPONSE_LEN {
        if input.read(&mut byte)? == 0 {
            return Err(TermError::MalformedEscapeResponse(
                "input closed before `R`".to_string(),
            ));
        }
        response.push(byte[0]);
        if byte[0] == b'R' {
            return Ok(response);
        }
    }
    Err(TermError::MalformedEscapeResponse(format!(
        "no `R` within {MAX_CURSOR_RESPONSE_LEN} bytes"
    )))
}

/// Parse `ESC [ rows ; cols R` into `(rows, cols)`.
pub fn parse_cursor_response(response: &[u8]) -> Result<(usize, usize), TermError> {
    let malformed = |why: &str| TermError::MalformedEscapeResponse(why.to_string());

    let body = response
        .strip_prefix(b"\x1b[")
        .ok_or_else(|| malformed("missing `ESC [` prefix"))?;
    let body = body
        .strip_suffix(b"R")
        .ok_or_else(|| malformed("missing trailing `R`"))?;

    let mut fields = body.split(|b| *b == b';');
    let (Some(rows), Some(cols), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(malformed("expected exactly two fields"));
    };
    let rows = parse_decimal(rows).ok_or_else(|| malformed("bad row field"))?;
    let cols = parse_decimal(cols).ok_or_else(|| malformed("bad column field"))?;
    if cols == 0 {
        return Err(malformed("column field is zero"));
    }
    Ok((rows, cols))
}

fn parse_decimal(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}
