//! Unified error types for the line editor.

use std::fmt;
use std::io;
use std::os::unix::io::RawFd;

// ---------------------------------------------------------------------------
// TermError
// ---------------------------------------------------------------------------

/// Errors arising from terminal control and the escape-sequence protocol.
#[derive(Debug)]
pub enum TermError {
    /// Raw mode was requested on a descriptor that is not a terminal device.
    NotATerminal,
    /// The terminal answered a cursor-position query with something other
    /// than `ESC [ rows ; cols R`.
    MalformedEscapeResponse(String),
    /// Raw mode is already active on another descriptor in this process.
    AlreadyActive(RawFd),
    /// The terminal did not answer a query within the configured wait.
    Timeout,
    /// Underlying OS call failed.
    Io(io::Error),
}

impl fmt::Display for TermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotATerminal => write!(f, "not a terminal"),
            Self::MalformedEscapeResponse(msg) => write!(f, "malformed escape response: {msg}"),
            Self::AlreadyActive(fd) => write!(f, "raw mode already active on fd {fd}"),
            Self::Timeout => write!(f, "terminal did not answer in time"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for TermError {}

impl From<io::Error> for TermError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::TimedOut {
            return Self::Timeout;
        }
        Self::Io(e)
    }
}

impl From<TermError> for io::Error {
    fn from(e: TermError) -> Self {
        match e {
            TermError::Io(inner) => inner,
            TermError::NotATerminal => io::Error::new(io::ErrorKind::Unsupported, e.to_string()),
            TermError::AlreadyActive(_) => io::Error::other(e.to_string()),
            TermError::Timeout => io::Error::new(io::ErrorKind::TimedOut, e.to_string()),
            TermError::MalformedEscapeResponse(_) => {
                io::Error::new(io::ErrorKind::InvalidData, e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryError
// ---------------------------------------------------------------------------

/// Errors from history persistence.
#[derive(Debug)]
pub enum HistoryError {
    Io(io::Error),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "history io: {e}"),
        }
    }
}

impl std::error::Error for HistoryError {}

impl From<io::Error> for HistoryError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_error_display() {
        assert_eq!(TermError::NotATerminal.to_string(), "not a terminal");
        assert_eq!(
            TermError::MalformedEscapeResponse("missing R".into()).to_string(),
            "malformed escape response: missing R"
        );
    }

    #[test]
    fn timed_out_io_error_maps_to_timeout() {
        let e = TermError::from(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        assert!(matches!(e, TermError::Timeout), "got: {e}");
    }

    #[test]
    fn term_error_round_trips_into_io_error() {
        let io_err: io::Error = TermError::NotATerminal.into();
        assert_eq!(io_err.kind(), io::ErrorKind::Unsupported);
        let io_err: io::Error = TermError::MalformedEscapeResponse("x".into()).into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn history_error_from_io() {
        let e = HistoryError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let s = e.to_string();
        assert!(s.starts_with("history io:"), "got: {s}");
        assert!(s.contains("gone"));
    }

    #[test]
    fn config_error_from_toml() {
        let toml_err: toml::de::Error = toml::from_str::<toml::Value>("x = [unclosed").unwrap_err();
        let e = ConfigError::from(toml_err);
        assert!(e.to_string().starts_with("toml:"));
    }

    #[test]
    fn config_error_invalid_message() {
        let e = ConfigError::Invalid("history.max_len must not be negative".into());
        assert_eq!(
            e.to_string(),
            "invalid config: history.max_len must not be negative"
        );
    }
}
