//! POSIX backend: raw termios, xterm/VT escape sequences, SIGWINCH via a
//! self-pipe, a terminfo-backed function-key table with static fallback.

mod composer;
mod reader;
mod sigwinch;
mod termios_guard;

use crate::{Backend, BackendError, Capabilities, PumpSignal};
use composer::Composer;
use core_cell::CellBuffer;
use core_event::{InputMode, OutputMode};
use core_width::WidthContext;
use reader::ModeCell;
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::sync::atomic::{AtomicBool, Ordering};
use crossbeam_channel::Sender;
use std::sync::Arc;
use termios_guard::TermiosGuard;
use tracing::{debug, warn};

const ENTER_CA_MODE: &[u8] = b"\x1b[?1049h";
const EXIT_CA_MODE: &[u8] = b"\x1b[?1049l";
const HIDE_CURSOR: &[u8] = b"\x1b[?25l";
const SHOW_CURSOR: &[u8] = b"\x1b[?25h";
const ENABLE_MOUSE: &[u8] = b"\x1b[?1000h\x1b[?1006h";
const DISABLE_MOUSE: &[u8] = b"\x1b[?1000l\x1b[?1006l";

static AMBIGUOUS_IS_WIDE: AtomicBool = AtomicBool::new(false);

pub struct PosixBackend {
    tty: Option<Arc<OwnedFd>>,
    guard: Option<TermiosGuard>,
    composer: Composer,
    mode: Arc<ModeCell>,
    output_mode: OutputMode,
    mouse_enabled: bool,
    reader_handle: Option<std::thread::JoinHandle<()>>,
    sigwinch_handle: Option<std::thread::JoinHandle<()>>,
    wake_write: Option<OwnedFd>,
}

impl Default for PosixBackend {
    fn default() -> Self {
        PosixBackend {
            tty: None,
            guard: None,
            composer: Composer::new(OutputMode::Normal),
            mode: Arc::new(ModeCell::new(InputMode::DEFAULT)),
            output_mode: OutputMode::Normal,
            mouse_enabled: false,
            reader_handle: None,
            sigwinch_handle: None,
            wake_write: None,
        }
    }
}

impl PosixBackend {
    fn write_raw(&self, bytes: &[u8]) -> Result<(), BackendError> {
        let fd = self
            .tty
            .as_ref()
            .ok_or_else(|| BackendError::Unsupported("backend not initialized".into()))?;
        nix::unistd::write(fd.as_fd(), bytes).map_err(std::io::Error::from)?;
        Ok(())
    }

    fn query_size(&self) -> Result<(u16, u16), BackendError> {
        let fd = self.tty.as_ref().unwrap();
        nix::ioctl_read_bad!(tiocgwinsz, nix::libc::TIOCGWINSZ, nix::libc::winsize);
        let mut size: nix::libc::winsize = unsafe { std::mem::zeroed() };
        unsafe { tiocgwinsz(fd.as_raw_fd(), &mut size) }
            .map_err(|e| BackendError::Io(std::io::Error::from(e)))?;
        Ok((size.ws_col, size.ws_row))
    }
}

impl Backend for PosixBackend {
    fn init(&mut self) -> Result<(u16, u16), BackendError> {
        let stdin = std::io::stdin();
        let raw_fd = stdin.as_fd().try_clone_to_owned()?;
        let guard = TermiosGuard::enable(raw_fd.as_fd().try_clone_to_owned()?)?;
        self.guard = Some(guard);
        self.tty = Some(Arc::new(raw_fd));

        self.write_raw(ENTER_CA_MODE)?;
        self.write_raw(HIDE_CURSOR)?;

        let size = self.query_size()?;
        debug!(width = size.0, height = size.1, "posix backend initialized");
        Ok(size)
    }

    fn close(&mut self) -> Result<(), BackendError> {
        if self.mouse_enabled {
            let _ = self.write_raw(DISABLE_MOUSE);
            self.mouse_enabled = false;
        }
        let _ = self.write_raw(EXIT_CA_MODE);
        let _ = self.write_raw(SHOW_CURSOR);

        if let Some(wake) = self.wake_write.take() {
            let _ = nix::unistd::write(wake.as_fd(), &[0u8]);
        }
        if let Some(h) = self.reader_handle.take() {
            let _ = h.join();
        }
        if let Some(h) = self.sigwinch_handle.take() {
            // The signal-hook iterator thread parks forever between
            // deliveries; detach it rather than block close() on a join
            // that would never return.
            drop(h);
        }
        self.guard = None;
        self.tty = None;
        Ok(())
    }

    fn set_input_mode(&mut self, mode: InputMode) -> Result<(), BackendError> {
        if mode.contains(InputMode::CURRENT) {
            return Ok(());
        }
        self.mode.set(mode);
        let want_mouse = mode.contains(InputMode::MOUSE);
        if want_mouse != self.mouse_enabled {
            self.write_raw(if want_mouse { ENABLE_MOUSE } else { DISABLE_MOUSE })?;
            self.mouse_enabled = want_mouse;
        }
        Ok(())
    }

    fn set_output_mode(&mut self, mode: OutputMode) -> Result<(), BackendError> {
        if mode == OutputMode::Current {
            return Ok(());
        }
        self.output_mode = mode;
        self.composer.set_mode(mode);
        Ok(())
    }

    fn paint(
        &mut self,
        front: &CellBuffer,
        changed: &[(u16, u16)],
        cursor: Option<(u16, u16)>,
    ) -> Result<(), BackendError> {
        let fd = self
            .tty
            .as_ref()
            .ok_or_else(|| BackendError::Unsupported("backend not initialized".into()))?;
        let mut file = std::fs::File::from(fd.as_fd().try_clone_to_owned()?);
        self.composer.compose(&mut file, front, changed, cursor)?;
        Ok(())
    }

    fn width_context(&self) -> WidthContext {
        WidthContext {
            ambiguous_is_wide: AMBIGUOUS_IS_WIDE.load(Ordering::Relaxed),
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { supports_rgb: true }
    }

    fn spawn_reader(&mut self, tx: Sender<PumpSignal>) -> std::thread::JoinHandle<()> {
        let fd = Arc::clone(self.tty.as_ref().expect("spawn_reader called before init"));

        let (wake_r, wake_w) = nix::unistd::pipe().expect("failed to create wake pipe");
        self.wake_write = Some(wake_w);
        let wake_fd = Arc::new(wake_r);

        match sigwinch::spawn(Arc::clone(&fd), tx.clone()) {
            Ok(h) => self.sigwinch_handle = Some(h),
            Err(e) => warn!(error = %e, "failed to install SIGWINCH listener"),
        }

        let mode = Arc::clone(&self.mode);
        std::thread::spawn(move || reader::run(fd, mode, tx, wake_fd))
    }
}
