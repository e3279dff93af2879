//! SIGWINCH delivery via a self-pipe (spec.md §9: no work inside the signal
//! handler itself). `signal_hook::iterator::Signals` already wraps the
//! pipe-and-poll dance; we just park it on its own thread, re-query
//! `TIOCGWINSZ` (there is no size carried by the signal itself) and push a
//! `PumpSignal::Resize` straight into the shared pump channel.

use crate::PumpSignal;
use signal_hook::consts::SIGWINCH;
use signal_hook::iterator::Signals;
use std::os::fd::{AsRawFd, OwnedFd};
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;

pub fn spawn(fd: Arc<OwnedFd>, tx: Sender<PumpSignal>) -> std::io::Result<JoinHandle<()>> {
    let mut signals = Signals::new([SIGWINCH])?;
    Ok(std::thread::spawn(move || {
        for _ in signals.forever() {
            match query_size(&fd) {
                Ok((w, h)) => {
                    if tx.send(PumpSignal::Resize(w, h)).is_err() {
                        break;
                    }
                }
                Err(_) => {
                    if tx.send(PumpSignal::FatalError(core_event::ErrorKind::Io)).is_err() {
                        break;
                    }
                }
            }
        }
    }))
}

fn query_size(fd: &OwnedFd) -> std::io::Result<(u16, u16)> {
    nix::ioctl_read_bad!(tiocgwinsz, nix::libc::TIOCGWINSZ, nix::libc::winsize);
    let mut size: nix::libc::winsize = unsafe { std::mem::zeroed() };
    unsafe { tiocgwinsz(fd.as_raw_fd(), &mut size) }.map_err(std::io::Error::from)?;
    Ok((size.ws_col, size.ws_row))
}
