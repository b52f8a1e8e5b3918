//! Thin `Read`/`Write` adapters over raw file descriptors.
//!
//! The editor talks to caller-supplied descriptors rather than the process
//! stdio handles, and raw-mode reads must not go through a userspace buffer
//! that could swallow bytes meant for the next key.

use std::io::{self, Read, Write};
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Report whether `fd` refers to a terminal device.
pub fn is_terminal(fd: RawFd) -> bool {
    // SAFETY: isatty only inspects the descriptor.
    unsafe { libc::isatty(fd) == 1 }
}

/// Unbuffered reader over a descriptor.
///
/// With a `timeout`, each `read` first waits for readability and fails with
/// `ErrorKind::TimedOut` when nothing arrives in time.
#[derive(Debug, Clone, Copy)]
pub struct FdReader {
    fd: RawFd,
    timeout: Option<Duration>,
}

impl FdReader {
    pub fn new(fd: RawFd) -> Self {
        Self { fd, timeout: None }
    }

    pub fn with_timeout(fd: RawFd, timeout: Option<Duration>) -> Self {
        Self { fd, timeout }
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    fn wait_readable(&self, timeout: Duration) -> io::Result<()> {
        let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        loop {
            // SAFETY: pfd is a valid pollfd for the duration of the call.
            let ready = unsafe { libc::poll(&mut pfd, 1, millis) };
            match ready {
                -1 => {
                    let err = io::Error::last_os_error();
                    if err.kind() == io::ErrorKind::Interrupted {
                        continue;
                    }
                    return Err(err);
                }
                0 => {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "no terminal response before timeout",
                    ))
                }
                _ => return Ok(()),
            }
        }
    }
}

impl Read for FdReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(timeout) = self.timeout {
            self.wait_readable(timeout)?;
        }
        loop {
            // SAFETY: buf is valid for writes of buf.len() bytes.
            let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }
}

/// Unbuffered writer over a descriptor.
#[derive(Debug, Clone, Copy)]
pub struct FdWriter {
    fd: RawFd,
}

impl FdWriter {
    pub fn new(fd: RawFd) -> Self {
        Self { fd }
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }
}

impl Write for FdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            // SAFETY: buf is valid for reads of buf.len() bytes.
            let n = unsafe { libc::write(self.fd, buf.as_ptr().cast(), buf.len()) };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipe() -> (RawFd, RawFd) {
        let mut fds = [0 as libc::c_int; 2];
        // SAFETY: fds has room for the two descriptors pipe() fills in.
        let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
        assert_eq!(rc, 0, "pipe() failed");
        (fds[0], fds[1])
    }

    fn close(fd: RawFd) {
        // SAFETY: the test owns the descriptor.
        unsafe {
            libc::close(fd);
        }
    }

    #[test]
    fn pipes_are_not_terminals() {
        let (r, w) = pipe();
        assert!(!is_terminal(r));
        assert!(!is_terminal(w));
        close(r);
        close(w);
    }

    #[test]
    fn writer_and_reader_move_bytes_through_a_pipe() {
        let (r, w) = pipe();
        FdWriter::new(w).write_all(b"hi").expect("write");
        close(w);

        let mut out = Vec::new();
        FdReader::new(r).read_to_end(&mut out).expect("read");
        assert_eq!(out, b"hi");
        close(r);
    }

    #[test]
    fn timed_reader_reports_timeout_on_silent_descriptor() {
        let (r, w) = pipe();
        let mut reader = FdReader::with_timeout(r, Some(Duration::from_millis(10)));
        let mut buf = [0u8; 1];
        let err = reader.read(&mut buf).expect_err("nothing was written");
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        close(r);
        close(w);
    }
}
