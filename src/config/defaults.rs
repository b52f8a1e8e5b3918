//! Default configuration constants.
//!
//! Callers share these instead of repeating literals.

use std::time::Duration;

/// Config file name looked up locally and under the config root.
pub(super) const CONFIG_FILE_NAME: &str = "rawline.toml";
/// Directory under the config root that holds [`CONFIG_FILE_NAME`].
pub(super) const CONFIG_DIR_NAME: &str = "rawline";
/// Default wait for the terminal to answer a cursor-position query.
pub(super) const DEFAULT_CURSOR_QUERY_TIMEOUT: Duration = Duration::from_millis(500);

/// Overrides `[history] file`.
pub(super) const ENV_HISTORY_FILE: &str = "RAWLINE_HISTORY_FILE";
/// Overrides `[history] max_len`.
pub(super) const ENV_HISTORY_MAX_LEN: &str = "RAWLINE_HISTORY_MAX_LEN";
