//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`RAWLINE_HISTORY_FILE`, `RAWLINE_HISTORY_MAX_LEN`).
//! 2. TOML file specified via the `--config` CLI flag.
//! 3. `./rawline.toml` in the current directory.
//! 4. `$XDG_CONFIG_HOME/rawline/rawline.toml` (or `~/.config/rawline/rawline.toml`).
//! 5. Built-in defaults.

use std::path::PathBuf;

mod defaults;
mod env;
mod loader;
mod resolve;
mod sources;
mod types;

pub use loader::{load_config, load_config_with_source, LoadedConfig};
pub use sources::ConfigSource;
pub use types::{Config, HistoryConfig, TerminalConfig};

/// Root directory for global config: `$XDG_CONFIG_HOME`, else `~/.config`.
pub fn config_root_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .or_else(dirs::config_dir)
}
