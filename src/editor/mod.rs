//! Session driver: pick a read strategy and return one finished line.
//!
//! A terminal input gets the raw-mode line editor. Pipes and files, and
//! terminals that cannot handle escape sequences, go through the plain
//! [`fallback`] reader instead. Whichever path runs, the caller sees the same
//! [`ReadOutcome`].

pub mod fallback;
pub mod keycodes;
pub mod keys;
pub mod line_state;
pub(crate) mod render;

pub use line_state::{EditState, LineState};
pub use render::display_width;

use crate::config::Config;
use crate::error::TermError;
use crate::history::HistoryRing;
use crate::terminal::{
    is_terminal, query_columns, supports_raw_mode_with, FdReader, FdWriter, ProbeOptions,
    TerminalSession, UNSUPPORTED_TERMS,
};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::os::unix::io::RawFd;

/// Result of one line read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A finished line, without its terminator. May be empty.
    Line(String),
    /// The user pressed the interrupt key; no line was produced.
    Cancelled,
    /// Input is exhausted.
    Eof,
}

/// How input is read, decided once per call from the descriptor and `TERM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStrategy {
    /// Raw-mode editing with history browsing.
    Interactive,
    /// Input is a pipe or file; read lines without prompting.
    Piped,
    /// A terminal known to mishandle escape sequences; prompt, then let the
    /// terminal's own line discipline do the editing.
    Unsupported,
}

/// Pick a strategy from what is known about the input.
pub fn select_strategy<S: AsRef<str>>(
    input_is_terminal: bool,
    term_name: Option<&str>,
    unsupported_terms: &[S],
) -> ReadStrategy {
    if !input_is_terminal {
        return ReadStrategy::Piped;
    }
    match term_name {
        Some(term) if !supports_raw_mode_with(term, unsupported_terms) => ReadStrategy::Unsupported,
        _ => ReadStrategy::Interactive,
    }
}

/// Knobs for [`Editor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    /// Append every finished non-empty line to the history ring.
    pub auto_add_history: bool,
    pub probe: ProbeOptions,
    /// `TERM` values that get the [`ReadStrategy::Unsupported`] path.
    pub unsupported_terms: Vec<String>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            auto_add_history: true,
            probe: ProbeOptions::default(),
            unsupported_terms: UNSUPPORTED_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl From<&Config> for EditorOptions {
    fn from(config: &Config) -> Self {
        Self {
            auto_add_history: config.history.auto_add,
            probe: ProbeOptions {
                default_columns: config.terminal.default_columns,
                response_timeout: config.terminal.cursor_query_timeout,
            },
            unsupported_terms: config.terminal.unsupported_terms.clone(),
        }
    }
}

/// Line editor bound to one pair of descriptors. Owns the history ring for
/// its whole lifetime.
#[derive(Debug)]
pub struct Editor {
    session: TerminalSession,
    history: HistoryRing,
    options: EditorOptions,
    /// Buffered reader for the non-raw paths, kept across calls so read-ahead
    /// is never lost.
    line_reader: Option<BufReader<FdReader>>,
}

impl Editor {
    /// Editor over the process standard input and output.
    pub fn new(options: EditorOptions) -> Self {
        Self::with_fds(libc::STDIN_FILENO, libc::STDOUT_FILENO, options)
    }

    pub fn with_fds(input_fd: RawFd, output_fd: RawFd, options: EditorOptions) -> Self {
        Self {
            session: TerminalSession::new(input_fd, output_fd),
            history: HistoryRing::default(),
            options,
            line_reader: None,
        }
    }

    /// Standard-stream editor whose options and history capacity come from
    /// `config`. The history file, if any, is not loaded here.
    pub fn from_config(config: &Config) -> Self {
        let mut editor = Self::new(EditorOptions::from(config));
        editor.history.set_max_len(config.history.max_len);
        editor
    }

    pub fn history(&self) -> &HistoryRing {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryRing {
        &mut self.history
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Strategy the next [`read_line`](Self::read_line) will use.
    pub fn strategy(&self) -> ReadStrategy {
        let term = std::env::var("TERM").ok();
        select_strategy(
            is_terminal(self.session.input_fd()),
            term.as_deref(),
            &self.options.unsupported_terms,
        )
    }

    /// Read one line, showing `prompt` where the strategy allows it.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        let strategy = self.strategy();
        tracing::debug!(?strategy, "reading line");
        let outcome = match strategy {
            ReadStrategy::Interactive => self.read_interactive(prompt)?,
            ReadStrategy::Piped => {
                fallback::read_line(line_reader(&mut self.line_reader, self.session.input_fd()))?
            }
            ReadStrategy::Unsupported => self.read_with_prompt(prompt)?,
        };

        if let ReadOutcome::Line(line) = &outcome {
            if self.options.auto_add_history && !line.is_empty() {
                self.history.add(line);
            }
        }
        Ok(outcome)
    }

    /// Clear the screen and home the cursor.
    pub fn clear_screen(&self) -> io::Result<()> {
        render::clear_screen(&mut FdWriter::new(self.session.output_fd()))
    }

    /// Key-code debugging: show every byte typed, in raw mode, until `quit`.
    pub fn print_keycodes(&mut self) -> io::Result<()> {
        let mut output = FdWriter::new(self.session.output_fd());
        output.write_all(keycodes::KEYCODES_BANNER.as_bytes())?;
        let guard = self.session.acquire()?;
        let mut input = FdReader::new(guard.input_fd());
        keycodes::dump_keycodes(&mut input, &mut output)
    }

    fn read_interactive(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        let input_fd = self.session.input_fd();
        let output_fd = self.session.output_fd();
        let guard = match self.session.acquire() {
            Ok(guard) => guard,
            Err(TermError::NotATerminal) => {
                tracing::warn!("input is not a terminal, reading without line editing");
                let reader = line_reader(&mut self.line_reader, input_fd);
                let mut output = FdWriter::new(output_fd);
                return fallback::read_line_with_prompt(reader, &mut output, prompt);
            }
            Err(e) => return Err(e.into()),
        };

        let cols = query_columns(guard.input_fd(), guard.output_fd(), self.options.probe);
        let mut input = FdReader::new(guard.input_fd());
        let mut output = BufWriter::new(FdWriter::new(guard.output_fd()));
        let outcome = edit_line(&mut input, &mut output, prompt, cols, &self.history);
        // Output post-processing is off, so the newline needs its own CR.
        let newline = output.write_all(b"\r\n").and_then(|()| output.flush());
        drop(output);
        drop(guard);
        let outcome = outcome?;
        newline?;
        Ok(outcome)
    }

    fn read_with_prompt(&mut self, prompt: &str) -> io::Result<ReadOutcome> {
        let mut output = FdWriter::new(self.session.output_fd());
        let reader = line_reader(&mut self.line_reader, self.session.input_fd());
        fallback::read_line_with_prompt(reader, &mut output, prompt)
    }
}

fn line_reader(slot: &mut Option<BufReader<FdReader>>, fd: RawFd) -> &mut BufReader<FdReader> {
    slot.get_or_insert_with(|| BufReader::new(FdReader::new(fd)))
}

/// Run one interactive edit over arbitrary byte streams.
///
/// The caller is responsible for raw mode; this only drives the state
/// machine. A closed input stream finishes the edit with whatever has been
/// typed, or [`ReadOutcome::Eof`] when nothing has.
pub fn edit_line<R, W>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    cols: usize,
    history: &HistoryRing,
) -> io::Result<ReadOutcome>
where
    R: Read,
    W: Write,
{
    let mut state = LineState::new(prompt, cols);
    state.start(output)?;
    let mut byte = [0u8; 1];
    loop {
        let read = match input.read(&mut byte) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        let edit = if read == 0 {
            state.end_of_input(output)?
        } else {
            state.feed(byte[0], history, output)?
        };
        match edit {
            EditState::Editing => {}
            EditState::Done(line) => return Ok(ReadOutcome::Line(line.clone())),
            EditState::Cancelled => return Ok(ReadOutcome::Cancelled),
            EditState::Eof => return Ok(ReadOutcome::Eof),
        }
    }
}
