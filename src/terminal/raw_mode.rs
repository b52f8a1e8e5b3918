//! Raw-mode terminal session with guaranteed restoration.
//!
//! The attribute snapshot taken on entry lives in one process-wide slot so
//! that the exit hook and the signal hook can restore it even when the
//! owning session object is never dropped. At most one descriptor can be raw
//! at a time; entering again on the same descriptor is a no-op, so the raw
//! attributes are never captured as the "original" ones.
//!
//! Signal handlers cannot take the slot's mutex, so every snapshot is also
//! published to a lock-free mirror that the handler claims with one atomic
//! swap.

use crate::error::TermError;
use crate::terminal::fd::is_terminal;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

/// Snapshot owned by the single active raw session.
struct SavedAttributes {
    fd: RawFd,
    original: libc::termios,
}

static ACTIVE: Mutex<Option<SavedAttributes>> = Mutex::new(None);

/// Copy of the active snapshot readable from a signal handler.
///
/// Written only while `ACTIVE` is held and the mirror is empty (`fd == -1`);
/// `fd` is stored last, so a non-negative `fd` means `original` is complete.
struct SignalMirror {
    fd: AtomicI32,
    original: UnsafeCell<MaybeUninit<libc::termios>>,
}

// SAFETY: `original` is only written while `fd == -1` under `ACTIVE`, and only
// read by whoever swapped a non-negative `fd` out.
unsafe impl Sync for SignalMirror {}

static SIGNAL_MIRROR: SignalMirror = SignalMirror {
    fd: AtomicI32::new(-1),
    original: UnsafeCell::new(MaybeUninit::uninit()),
};

impl SignalMirror {
    /// Caller holds `ACTIVE`.
    fn publish(&self, fd: RawFd, original: &libc::termios) {
        // SAFETY: the mirror is empty, so no reader can be looking at it.
        unsafe {
            (*self.original.get()).write(*original);
        }
        self.fd.store(fd, Ordering::Release);
    }

    fn clear(&self) {
        self.fd.store(-1, Ordering::Release);
    }

    /// Claim the snapshot and restore it. Async-signal-safe: one atomic swap
    /// and `tcsetattr`. Returns whether anything was restored.
    fn restore(&self) -> bool {
        let fd = self.fd.swap(-1, Ordering::AcqRel);
        if fd < 0 {
            return false;
        }
        // SAFETY: a non-negative fd was published after `original` was written.
        unsafe {
            libc::tcsetattr(fd, libc::TCSAFLUSH, (*self.original.get()).as_ptr());
        }
        true
    }
}

/// Signals whose default action would leave the terminal raw.
const RESTORE_ON_SIGNALS: [libc::c_int; 3] = [libc::SIGTERM, libc::SIGHUP, libc::SIGQUIT];

/// Handle to a terminal that can be switched into raw mode.
///
/// Exit and signal hooks are registered once per session object, the first
/// time it enters raw mode. Dropping the session restores the terminal if
/// this session left it raw.
#[derive(Debug)]
pub struct TerminalSession {
    input_fd: RawFd,
    output_fd: RawFd,
    hooks_installed: bool,
}

impl TerminalSession {
    pub fn new(input_fd: RawFd, output_fd: RawFd) -> Self {
        Self {
            input_fd,
            output_fd,
            hooks_installed: false,
        }
    }

    /// Session over the process standard input and output.
    pub fn stdio() -> Self {
        Self::new(libc::STDIN_FILENO, libc::STDOUT_FILENO)
    }

    pub fn input_fd(&self) -> RawFd {
        self.input_fd
    }

    pub fn output_fd(&self) -> RawFd {
        self.output_fd
    }

    /// Whether this session's input descriptor is the one currently raw.
    pub fn is_raw(&self) -> bool {
        active_fd() == Some(self.input_fd)
    }

    /// Switch the input descriptor into raw mode.
    ///
    /// Fails with [`TermError::NotATerminal`] for pipes and files, and with
    /// [`TermError::AlreadyActive`] when another descriptor is already raw.
    pub fn enable(&mut self) -> Result<(), TermError> {
        if !is_terminal(self.input_fd) {
            return Err(TermError::NotATerminal);
        }

        let mut active = lock_active();
        if let Some(saved) = active.as_ref() {
            if saved.fd == self.input_fd {
                tracing::trace!(fd = self.input_fd, "raw mode already enabled");
                return Ok(());
            }
            return Err(TermError::AlreadyActive(saved.fd));
        }

        if !self.hooks_installed {
            install_exit_hooks();
            self.hooks_installed = true;
        }

        let original = get_attributes(self.input_fd)?;
        let raw = raw_attributes(&original);
        set_attributes(self.input_fd, &raw)?;
        SIGNAL_MIRROR.publish(self.input_fd, &original);
        *active = Some(SavedAttributes {
            fd: self.input_fd,
            original,
        });
        tracing::debug!(fd = self.input_fd, "raw mode enabled");
        Ok(())
    }

    /// Restore the attributes captured by [`enable`](Self::enable).
    ///
    /// A no-op when this session is not raw.
    pub fn disable(&self) -> Result<(), TermError> {
        let mut active = lock_active();
        let Some(saved) = active.as_ref() else {
            return Ok(());
        };
        if saved.fd != self.input_fd {
            return Ok(());
        }
        SIGNAL_MIRROR.clear();
        set_attributes(saved.fd, &saved.original)?;
        *active = None;
        tracing::debug!(fd = self.input_fd, "raw mode disabled");
        Ok(())
    }

    /// Enter raw mode and return a guard that leaves it on drop, so every
    /// return path (including unwinding) restores the terminal.
    pub fn acquire(&mut self) -> Result<RawModeGuard<'_>, TermError> {
        self.enable()?;
        Ok(RawModeGuard { session: self })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.disable();
    }
}

/// Raw mode lifetime guard so terminal state is restored on any return path.
#[derive(Debug)]
pub struct RawModeGuard<'a> {
    session: &'a TerminalSession,
}

impl RawModeGuard<'_> {
    pub fn input_fd(&self) -> RawFd {
        self.session.input_fd
    }

    pub fn output_fd(&self) -> RawFd {
        self.session.output_fd
    }
}

impl Drop for RawModeGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.session.disable() {
            tracing::warn!(error = %e, "failed to restore terminal attributes");
        }
    }
}

/// Derive raw attributes from `original`: no input translation or flow
/// control, no output post-processing, 8-bit chars, no echo, no canonical
/// mode, no extended input, no signal characters, reads return after one
/// byte with no timer.
pub fn raw_attributes(original: &libc::termios) -> libc::termios {
    let mut raw = *original;
    raw.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
    raw.c_oflag &= !libc::OPOST;
    raw.c_cflag |= libc::CS8;
    raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
    raw.c_cc[libc::VMIN] = 1;
    raw.c_cc[libc::VTIME] = 0;
    raw
}

fn get_attributes(fd: RawFd) -> Result<libc::termios, TermError> {
    // SAFETY: termios is plain data; tcgetattr fills it in or fails.
    let mut attrs: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, &mut attrs) } == -1 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(attrs)
}

fn set_attributes(fd: RawFd, attrs: &libc::termios) -> Result<(), TermError> {
    // SAFETY: attrs points to a valid termios for the duration of the call.
    if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, attrs) } == -1 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

fn lock_active() -> std::sync::MutexGuard<'static, Option<SavedAttributes>> {
    // A panic while holding the lock must not block restoration later.
    ACTIVE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn active_fd() -> Option<RawFd> {
    lock_active().as_ref().map(|saved| saved.fd)
}

fn install_exit_hooks() {
    // SAFETY: restore_at_exit is a plain extern "C" fn with no arguments.
    if unsafe { libc::atexit(restore_at_exit) } != 0 {
        tracing::warn!("could not register exit hook for terminal restore");
    }
    for signal in RESTORE_ON_SIGNALS {
        install_signal_hook(signal);
    }
}

/// Install the restore handler for `signal`, leaving caller-installed
/// handlers alone.
fn install_signal_hook(signal: libc::c_int) {
    // SAFETY: sigaction structs are plain data; the handler only uses an
    // atomic swap, tcsetattr and raise.
    unsafe {
        let mut current: libc::sigaction = std::mem::zeroed();
        if libc::sigaction(signal, std::ptr::null(), &mut current) != 0 {
            return;
        }
        if current.sa_sigaction != libc::SIG_DFL {
            return;
        }
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = restore_on_signal as libc::sighandler_t;
        action.sa_flags = libc::SA_RESETHAND;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(signal, &action, std::ptr::null_mut());
    }
}

extern "C" fn restore_at_exit() {
    let mut active = lock_active();
    if let Some(saved) = active.take() {
        SIGNAL_MIRROR.clear();
        // Leave the shell prompt at column zero, then restore.
        // SAFETY: writing a static byte; saved.original came from tcgetattr.
        unsafe {
            libc::write(libc::STDOUT_FILENO, b"\r".as_ptr().cast(), 1);
            libc::tcsetattr(saved.fd, libc::TCSAFLUSH, &saved.original);
        }
    }
}

extern "C" fn restore_on_signal(signal: libc::c_int) {
    SIGNAL_MIRROR.restore();
    // SA_RESETHAND restored the default action; deliver it again.
    // SAFETY: raise is async-signal-safe.
    unsafe {
        libc::raise(signal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::sync::Mutex as TestMutex;

    // Raw state is process-wide; serialize tests that touch it.
    static SERIAL: TestMutex<()> = TestMutex::new(());

    /// Open a pseudo-terminal pair, returning `(master, slave)`.
    fn open_pty() -> Option<(RawFd, RawFd)> {
        // SAFETY: standard posix_openpt sequence; descriptors are closed by
        // the caller.
        unsafe {
            let master = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
            if master < 0 {
                return None;
            }
            if libc::grantpt(master) != 0 || libc::unlockpt(master) != 0 {
                libc::close(master);
                return None;
            }
            let name = libc::ptsname(master);
            if name.is_null() {
                libc::close(master);
                return None;
            }
            let name = CStr::from_ptr(name).to_owned();
            let slave = libc::open(name.as_ptr(), libc::O_RDWR | libc::O_NOCTTY);
            if slave < 0 {
                libc::close(master);
                return None;
            }
            Some((master, slave))
        }
    }

    fn close(fd: RawFd) {
        // SAFETY: the test owns the descriptor.
        unsafe {
            libc::close(fd);
        }
    }

    fn lflag(fd: RawFd) -> libc::tcflag_t {
        get_attributes(fd).expect("tcgetattr").c_lflag
    }

    #[test]
    fn raw_attributes_clear_line_discipline_flags() {
        // SAFETY: zeroed termios is a valid value for a pure transformation.
        let mut original: libc::termios = unsafe { std::mem::zeroed() };
        original.c_lflag = libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN;
        original.c_iflag = libc::ICRNL | libc::IXON;
        original.c_oflag = libc::OPOST;

        let raw = raw_attributes(&original);
        assert_eq!(raw.c_lflag & (libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN), 0);
        assert_eq!(raw.c_iflag & (libc::ICRNL | libc::IXON), 0);
        assert_eq!(raw.c_oflag & libc::OPOST, 0);
        assert_eq!(raw.c_cflag & libc::CS8, libc::CS8);
        assert_eq!(raw.c_cc[libc::VMIN], 1);
        assert_eq!(raw.c_cc[libc::VTIME], 0);
    }

    #[test]
    fn enable_rejects_non_terminals() {
        let _serial = SERIAL.lock().unwrap_or_else(|p| p.into_inner());
        let mut fds = [0 as libc::c_int; 2];
        // SAFETY: fds has room for both descriptors.
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let mut session = TerminalSession::new(fds[0], fds[1]);
        assert!(matches!(session.enable(), Err(TermError::NotATerminal)));
        assert!(!session.is_raw());
        drop(session);
        close(fds[0]);
        close(fds[1]);
    }

    #[test]
    fn disable_without_enable_is_a_no_op() {
        let _serial = SERIAL.lock().unwrap_or_else(|p| p.into_inner());
        let Some((master, slave)) = open_pty() else {
            return;
        };
        let before = lflag(slave);
        let session = TerminalSession::new(slave, slave);
        session.disable().expect("no-op disable");
        session.disable().expect("still a no-op");
        assert_eq!(lflag(slave), before);
        drop(session);
        close(slave);
        close(master);
    }

    #[test]
    fn double_enable_keeps_original_snapshot() {
        let _serial = SERIAL.lock().unwrap_or_else(|p| p.into_inner());
        let Some((master, slave)) = open_pty() else {
            return;
        };
        let before = lflag(slave);
        assert_ne!(before & libc::ICANON, 0, "pty starts canonical");

        let mut session = TerminalSession::new(slave, slave);
        session.enable().expect("enable");
        assert!(session.is_raw());
        assert_eq!(lflag(slave) & (libc::ICANON | libc::ECHO), 0);

        session.enable().expect("second enable is a no-op");
        session.disable().expect("disable");
        assert!(!session.is_raw());
        assert_eq!(lflag(slave), before, "original attributes restored");

        drop(session);
        close(slave);
        close(master);
    }

    #[test]
    fn guard_restores_on_drop_and_blocks_second_descriptor() {
        let _serial = SERIAL.lock().unwrap_or_else(|p| p.into_inner());
        let Some((master_a, slave_a)) = open_pty() else {
            return;
        };
        let Some((master_b, slave_b)) = open_pty() else {
            close(slave_a);
            close(master_a);
            return;
        };
        let before = lflag(slave_a);

        let mut first = TerminalSession::new(slave_a, slave_a);
        let mut second = TerminalSession::new(slave_b, slave_b);
        {
            let guard = first.acquire().expect("acquire");
            assert_eq!(guard.input_fd(), slave_a);
            assert!(matches!(
                second.enable(),
                Err(TermError::AlreadyActive(fd)) if fd == slave_a
            ));
        }
        assert_eq!(lflag(slave_a), before);
        assert!(!first.is_raw());

        drop(first);
        drop(second);
        for fd in [slave_a, master_a, slave_b, master_b] {
            close(fd);
        }
    }

    #[test]
    fn signal_path_restores_without_taking_the_lock() {
        let _serial = SERIAL.lock().unwrap_or_else(|p| p.into_inner());
        let Some((master, slave)) = open_pty() else {
            return;
        };
        let before = lflag(slave);

        let mut session = TerminalSession::new(slave, slave);
        session.enable().expect("enable");
        {
            // Holding the slot mutex must not stop the signal path.
            let _held = lock_active();
            assert!(SIGNAL_MIRROR.restore());
            assert!(!SIGNAL_MIRROR.restore(), "snapshot is claimed once");
        }
        assert_eq!(lflag(slave), before);

        session.disable().expect("disable");
        assert!(!session.is_raw());
        assert!(!SIGNAL_MIRROR.restore(), "disable leaves the mirror empty");

        drop(session);
        close(slave);
        close(master);
    }
}
