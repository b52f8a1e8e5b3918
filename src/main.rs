//! CLI entry point for the rawline demo.

mod cli;

use clap::Parser;
use rawline::config::load_config;
use rawline::editor::{Editor, ReadOutcome};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Env var holding the log filter directive, e.g. `RAWLINE_LOG=debug`.
const LOG_ENV: &str = "RAWLINE_LOG";

fn main() {
    let args = cli::Args::parse();

    if let Err(e) = init_logging(args.log_file.as_deref()) {
        eprintln!("warning: failed to open log file: {e}");
    }

    let mut config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(path) = args.history_file {
        config.history.file = Some(path);
    }

    let mut editor = Editor::from_config(&config);

    if args.keycodes {
        if let Err(e) = editor.print_keycodes() {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let history_file = config.history.file.clone();
    if let Some(path) = &history_file {
        if let Err(e) = editor.history_mut().load(path) {
            eprintln!("warning: failed to load history from {}: {e}", path.display());
        }
    }

    loop {
        let line = match editor.read_line(&args.prompt) {
            Ok(ReadOutcome::Line(line)) => line,
            Ok(ReadOutcome::Cancelled | ReadOutcome::Eof) => break,
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        };

        if let Some(rest) = line.strip_prefix("/historylen") {
            match rest.trim().parse::<usize>() {
                Ok(len) => editor.history_mut().set_max_len(len),
                Err(_) => println!("usage: /historylen <n>"),
            }
        } else if line.starts_with('/') {
            println!("Unrecognized command: {line}");
        } else if !line.is_empty() {
            println!("echo: '{line}'");
        }

        if let Some(path) = &history_file {
            if let Err(e) = editor.history().save(path) {
                eprintln!("warning: failed to save history to {}: {e}", path.display());
            }
        }
    }
}

/// Install the fmt subscriber. Filter comes from `RAWLINE_LOG`, default
/// `warn`. Falls back to stderr when the log file cannot be opened.
fn init_logging(log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let file = log_file
        .map(|path| OpenOptions::new().create(true).append(true).open(path))
        .transpose();
    match file {
        Ok(Some(file)) => {
            let _ = builder
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
            Ok(())
        }
        Ok(None) => {
            let _ = builder.with_writer(std::io::stderr).try_init();
            Ok(())
        }
        Err(e) => {
            let _ = builder.with_writer(std::io::stderr).try_init();
            Err(e)
        }
    }
}
