//! Shared test fixtures for history, probe, and editor test modules.
//!
//! Keeping tiny reusable helpers here prevents each test module from
//! rebuilding ad-hoc temp dir and scripted-terminal code.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    /// Create a unique temporary directory with a readable prefix.
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!(
            "rawline-{prefix}-{}-{millis}-{suffix}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    /// Root directory path for this fixture.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build a child path under the fixture root.
    pub fn child(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Write UTF-8 text to a child path, creating parent directories as needed.
    pub fn write_text(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.child(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories for fixture");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Reader that hands out one byte per `read` call, like a raw-mode tty with
/// `VMIN = 1`, and counts how many bytes were consumed.
#[derive(Debug)]
pub struct ByteAtATime {
    bytes: Vec<u8>,
    consumed: usize,
}

impl ByteAtATime {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            consumed: 0,
        }
    }

    /// Number of bytes handed out so far.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl Read for ByteAtATime {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.consumed >= self.bytes.len() {
            return Ok(0);
        }
        buf[0] = self.bytes[self.consumed];
        self.consumed += 1;
        Ok(1)
    }
}

/// Control-key byte for an ASCII letter (`ctrl(b'c') == 3`).
pub fn ctrl(letter: u8) -> u8 {
    letter.to_ascii_lowercase() & 0x1f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_writes_and_resolves_paths() {
        let fixture = TestTempDir::new("fixture");
        let file = fixture.write_text("nested/file.txt", "hello");
        assert!(file.starts_with(fixture.path()));
        assert_eq!(fs::read_to_string(file).unwrap(), "hello");
    }

    #[test]
    fn byte_reader_yields_single_bytes() {
        let mut reader = ByteAtATime::new(b"ab");
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'a');
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        assert_eq!(reader.consumed(), 2);
    }

    #[test]
    fn ctrl_maps_letters_to_control_codes() {
        assert_eq!(ctrl(b'c'), 3);
        assert_eq!(ctrl(b'A'), 1);
        assert_eq!(ctrl(b'w'), 23);
    }
}
