//! rawline: a small raw-mode line editor for terminal programs.
//!
//! Reads one line at a time from a terminal with in-place editing and a
//! bounded history, and falls back to plain line reading for pipes and
//! terminals that cannot handle escape sequences. The terminal is always
//! restored on the way out, including on signals and panics.
//!
//! # Quick start
//!
//! ```no_run
//! use rawline::editor::{Editor, EditorOptions, ReadOutcome};
//!
//! let mut editor = Editor::new(EditorOptions::default());
//! while let Ok(ReadOutcome::Line(line)) = editor.read_line("> ") {
//!     println!("got {line:?}");
//! }
//! ```

pub mod config;
pub mod editor;
pub mod error;
pub mod history;
pub mod terminal;
#[cfg(test)]
pub mod testsupport;

pub use editor::{edit_line, Editor, EditorOptions, ReadOutcome, ReadStrategy};
pub use error::{ConfigError, HistoryError, TermError};
pub use history::HistoryRing;
