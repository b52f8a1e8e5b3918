//! CLI argument parsing via clap.

use clap::Parser;
use std::path::PathBuf;

/// Line-editing demo: reads lines, echoes them back, keeps history.
#[derive(Debug, Parser)]
#[command(name = "rawline", version)]
pub struct Args {
    /// Path to config file (default: ./rawline.toml or ~/.config/rawline/rawline.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// History file to load at start and save after every line.
    #[arg(long = "history-file", value_name = "PATH")]
    pub history_file: Option<PathBuf>,

    /// Prompt shown before each line.
    #[arg(short = 'p', long = "prompt", default_value = "hello> ")]
    pub prompt: String,

    /// Print the code of every key pressed until `quit` is typed.
    #[arg(long = "keycodes")]
    pub keycodes: bool,

    /// Write logs to this file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn defaults_without_flags() {
        let args = Args::parse_from(["rawline"]);
        assert_eq!(args.prompt, "hello> ");
        assert!(args.config.is_none());
        assert!(args.history_file.is_none());
        assert!(!args.keycodes);
    }

    #[test]
    fn paths_and_prompt_parse() {
        let args = Args::parse_from([
            "rawline",
            "--config",
            "/tmp/r.toml",
            "--history-file",
            "h.txt",
            "--prompt",
            "$ ",
            "--log-file",
            "log.txt",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/r.toml")));
        assert_eq!(args.history_file, Some(PathBuf::from("h.txt")));
        assert_eq!(args.prompt, "$ ");
        assert_eq!(args.log_file, Some(PathBuf::from("log.txt")));
    }

    #[test]
    fn keycodes_flag_parses() {
        let args = Args::parse_from(["rawline", "--keycodes"]);
        assert!(args.keycodes);
    }
}
