//! Turn the parsed file layout into a validated [`Config`].

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

use super::types::FileConfig;
use super::Config;

pub(super) fn resolve_config_from_file_config<FHome>(
    parsed: FileConfig,
    home_dir: &FHome,
) -> Result<Config, ConfigError>
where
    FHome: Fn() -> Option<PathBuf>,
{
    let mut config = Config::default();

    let history = parsed.history;
    if let Some(max_len) = history.max_len {
        config.history.max_len = history_max_len(max_len, "history.max_len")?;
    }
    if let Some(file) = history.file.filter(|f| !f.trim().is_empty()) {
        config.history.file = Some(expand_home(file.trim(), home_dir));
    }
    if let Some(auto_add) = history.auto_add {
        config.history.auto_add = auto_add;
    }

    let terminal = parsed.terminal;
    if let Some(cols) = terminal.default_columns {
        config.terminal.default_columns = usize::try_from(cols)
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "terminal.default_columns must be a positive integer, got {cols}"
                ))
            })?;
    }
    if let Some(ms) = terminal.cursor_query_timeout_ms {
        config.terminal.cursor_query_timeout = (ms > 0).then(|| Duration::from_millis(ms));
    }
    if let Some(terms) = terminal.unsupported_terms {
        config.terminal.unsupported_terms = terms;
    }

    Ok(config)
}

/// Validate a history capacity. Negative values are rejected, not wrapped.
pub(super) fn history_max_len(value: i64, key: &str) -> Result<usize, ConfigError> {
    usize::try_from(value).map_err(|_| {
        ConfigError::Invalid(format!(
            "{key} must be zero or a positive integer, got {value}"
        ))
    })
}

/// Expand a leading `~/` against the home directory.
pub(super) fn expand_home<FHome>(path: &str, home_dir: &FHome) -> PathBuf
where
    FHome: Fn() -> Option<PathBuf>,
{
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
