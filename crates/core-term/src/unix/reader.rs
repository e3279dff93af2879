//! Background byte reader: reads from the tty fd in a loop, feeds bytes
//! through `core_input::parse_event`, and forwards decoded events plus the
//! lone-ESC timeout fallback into the pump channel. Each raw chunk read is
//! also forwarded verbatim as `PumpSignal::Raw` before decoding, for
//! `PollRawEvent`.

use core_event::InputMode;
use crate::PumpSignal;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::os::fd::{AsFd, OwnedFd};
use std::sync::atomic::{AtomicU8, Ordering};
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::time::Duration;

const LONE_ESC_TIMEOUT: Duration = Duration::from_millis(50);

/// Shared, lock-free view of the current input mode; the reader polls it
/// each loop iteration so `SetInputMode` takes effect without restarting
/// the thread.
pub struct ModeCell(AtomicU8);

impl ModeCell {
    pub fn new(mode: InputMode) -> Self {
        ModeCell(AtomicU8::new(mode.bits()))
    }

    pub fn set(&self, mode: InputMode) {
        self.0.store(mode.bits(), Ordering::Relaxed);
    }

    fn get(&self) -> InputMode {
        InputMode::from_bits_truncate(self.0.load(Ordering::Relaxed))
    }
}

pub fn run(fd: Arc<OwnedFd>, mode: Arc<ModeCell>, tx: Sender<PumpSignal>, wake_fd: Arc<OwnedFd>) {
    let mut buf = [0u8; 256];
    let mut pending = Vec::<u8>::new();

    loop {
        let mut fds = [
            PollFd::new(fd.as_fd(), PollFlags::POLLIN),
            PollFd::new(wake_fd.as_fd(), PollFlags::POLLIN),
        ];
        let timeout = if pending.is_empty() {
            PollTimeout::NONE
        } else {
            PollTimeout::from(LONE_ESC_TIMEOUT.as_millis() as u16)
        };
        let ready = match poll(&mut fds, timeout) {
            Ok(n) => n,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(_) => {
                let _ = tx.send(PumpSignal::FatalError(core_event::ErrorKind::Io));
                return;
            }
        };

        if fds[1].revents().is_some_and(|r| r.contains(PollFlags::POLLIN)) {
            return;
        }

        if ready == 0 {
            if let Some((event, n)) = core_input::resolve_lone_esc_timeout(&pending) {
                pending.drain(..n);
                if tx.send(PumpSignal::Decoded(event)).is_err() {
                    return;
                }
            }
            continue;
        }

        if fds[0].revents().is_some_and(|r| r.contains(PollFlags::POLLIN)) {
            let n = match nix::unistd::read(fd.as_fd(), &mut buf) {
                Ok(0) => return,
                Ok(n) => n,
                Err(nix::errno::Errno::EINTR) => continue,
                Err(_) => {
                    let _ = tx.send(PumpSignal::FatalError(core_event::ErrorKind::Io));
                    return;
                }
            };
            if tx.send(PumpSignal::Raw(buf[..n].to_vec())).is_err() {
                return;
            }
            pending.extend_from_slice(&buf[..n]);
        }

        loop {
            if pending.is_empty() {
                break;
            }
            let (event, consumed) = core_input::parse_event(&pending, mode.get());
            if consumed == 0 {
                break;
            }
            pending.drain(..consumed);
            if tx.send(PumpSignal::Decoded(event)).is_err() {
                return;
            }
        }
    }
}
