//! Configuration data model.
//!
//! `File*` structs mirror the TOML layout with every key optional; the
//! resolved [`Config`] carries concrete values with defaults filled in.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::DEFAULT_CURSOR_QUERY_TIMEOUT;
use crate::history::DEFAULT_HISTORY_MAX_LEN;
use crate::terminal::{DEFAULT_COLUMNS, UNSUPPORTED_TERMS};

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub history: HistoryConfig,
    pub terminal: TerminalConfig,
}

/// History ring settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Ring capacity; `0` disables history.
    pub max_len: usize,
    /// Where history is loaded from and saved to. `None` keeps it in memory.
    pub file: Option<PathBuf>,
    /// Append finished non-empty lines automatically.
    pub auto_add: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_HISTORY_MAX_LEN,
            file: None,
            auto_add: true,
        }
    }
}

/// Terminal probing settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Width used when the terminal cannot report its own.
    pub default_columns: usize,
    /// Bounded wait for a cursor-position reply; `None` waits forever.
    pub cursor_query_timeout: Option<Duration>,
    /// `TERM` values that skip raw mode.
    pub unsupported_terms: Vec<String>,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            default_columns: DEFAULT_COLUMNS,
            cursor_query_timeout: Some(DEFAULT_CURSOR_QUERY_TIMEOUT),
            unsupported_terms: UNSUPPORTED_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// On-disk layout of `rawline.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct FileConfig {
    pub history: FileHistoryConfig,
    pub terminal: FileTerminalConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct FileHistoryConfig {
    /// Signed so a negative value is reported rather than failing to parse.
    pub max_len: Option<i64>,
    pub file: Option<String>,
    pub auto_add: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct FileTerminalConfig {
    pub default_columns: Option<i64>,
    /// Milliseconds; `0` means wait forever.
    pub cursor_query_timeout_ms: Option<u64>,
    pub unsupported_terms: Option<Vec<String>>,
}
