//! Terminal plumbing: descriptor I/O, capability probing, and raw mode.

pub mod fd;
pub mod probe;
pub mod raw_mode;

pub use fd::{is_terminal, FdReader, FdWriter};
pub use probe::{
    query_columns, supports_raw_mode, supports_raw_mode_with, ProbeOptions, DEFAULT_COLUMNS,
    UNSUPPORTED_TERMS,
};
pub use raw_mode::{RawModeGuard, TerminalSession};
