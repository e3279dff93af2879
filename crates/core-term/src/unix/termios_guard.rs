//! Raw-mode termios guard: applies cbreak/no-echo settings on construction,
//! restores the original `termios` on drop. Grounded on the scoped-guard
//! idiom used for the tty backend rather than a global enable/disable pair.

use nix::sys::termios::{self, SetArg, Termios};
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

pub struct TermiosGuard {
    fd: OwnedFd,
    original: Termios,
}

impl TermiosGuard {
    /// Puts `fd` into raw mode: no canonical line buffering, no echo, no
    /// signal-generating control characters (those are decoded by the
    /// input parser instead), single-byte reads.
    pub fn enable(fd: OwnedFd) -> Result<Self, std::io::Error> {
        let original = termios::tcgetattr(fd.as_fd()).map_err(std::io::Error::from)?;
        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(fd.as_fd(), SetArg::TCSANOW, &raw).map_err(std::io::Error::from)?;
        Ok(TermiosGuard { fd, original })
    }

    pub fn fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl Drop for TermiosGuard {
    fn drop(&mut self) {
        let _ = termios::tcsetattr(self.fd.as_fd(), SetArg::TCSANOW, &self.original);
    }
}
