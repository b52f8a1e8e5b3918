//! Bounded, duplicate-free input history with line-delimited persistence.

use crate::error::HistoryError;
use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Default number of entries retained when no limit is configured.
pub const DEFAULT_HISTORY_MAX_LEN: usize = 100;

/// Ordered store of previously submitted lines, newest last.
///
/// No two entries are equal and the length never exceeds `max_len`; when the
/// ring is full the oldest entry is evicted before a new one is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRing {
    entries: VecDeque<String>,
    max_len: usize,
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_MAX_LEN)
    }
}

impl HistoryRing {
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_len,
        }
    }

    /// Append `line` as the newest entry.
    ///
    /// Returns `false` without touching the ring when history is disabled
    /// (`max_len == 0`), when `line` already exists anywhere in the ring, or
    /// when `line` contains a line break (unrepresentable in the file format).
    pub fn add(&mut self, line: &str) -> bool {
        if self.max_len == 0 {
            return false;
        }
        if line.contains(['\n', '\r']) {
            tracing::debug!("rejecting multi-line history entry");
            return false;
        }
        if self.entries.iter().any(|existing| existing == line) {
            return false;
        }
        if self.entries.len() >= self.max_len {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
        true
    }

    /// Change the capacity, keeping only the newest `max_len` entries.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len;
        if self.entries.len() > max_len {
            let overflow = self.entries.len() - max_len;
            self.entries.drain(0..overflow);
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entry by age: `0` is the newest, `len() - 1` the oldest.
    pub fn get_from_newest(&self, age: usize) -> Option<&str> {
        let idx = self.entries.len().checked_sub(age + 1)?;
        self.entries.get(idx).map(String::as_str)
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Write entries oldest-to-newest, one per line.
    ///
    /// The file is created owner read/write only regardless of the process
    /// umask, and an existing file is narrowed to the same mode before any
    /// history text is written to it.
    pub fn save(&self, path: &Path) -> Result<(), HistoryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut options = fs::OpenOptions::new();
        options.create(true).truncate(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        let mut writer = io::BufWriter::new(&mut file);
        for entry in &self.entries {
            writer.write_all(entry.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        tracing::debug!(path = %path.display(), entries = self.entries.len(), "history saved");
        Ok(())
    }

    /// Replace the ring with the lines of `path`.
    ///
    /// A missing file yields an empty ring. Blank lines are skipped, and the
    /// usual capacity and duplicate rules apply while loading, so the newest
    /// `max_len` distinct lines survive.
    pub fn load(&mut self, path: &Path) -> Result<(), HistoryError> {
        self.entries.clear();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no history file yet");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        for line in raw.lines() {
            if line.is_empty() {
                continue;
            }
            self.add(line);
        }
        tracing::debug!(path = %path.display(), entries = self.entries.len(), "history loaded");
        Ok(())
    }
}
