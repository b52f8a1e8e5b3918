//! Environment overrides applied after file resolution.

use std::path::PathBuf;

use crate::error::ConfigError;

use super::defaults::{ENV_HISTORY_FILE, ENV_HISTORY_MAX_LEN};
use super::resolve::{expand_home, history_max_len};
use super::Config;

pub(super) fn apply_env_overrides<FEnv, FHome>(
    config: &mut Config,
    env_lookup: &FEnv,
    home_dir: &FHome,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
    FHome: Fn() -> Option<PathBuf>,
{
    if let Some(file) = non_empty(env_lookup(ENV_HISTORY_FILE)) {
        config.history.file = Some(expand_home(&file, home_dir));
    }
    if let Some(raw) = non_empty(env_lookup(ENV_HISTORY_MAX_LEN)) {
        let parsed = raw.parse::<i64>().map_err(|_| {
            ConfigError::Invalid(format!(
                "invalid {ENV_HISTORY_MAX_LEN} value `{raw}`: expected a non-negative integer"
            ))
        })?;
        config.history.max_len = history_max_len(parsed, ENV_HISTORY_MAX_LEN)?;
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
