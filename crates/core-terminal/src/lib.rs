//! The public cell-grid terminal API: a double-buffered `width x height`
//! grid of cells, flushed to a platform backend by diffing back against
//! front. See [`Session`] for the owned value and the module-level
//! free functions for the thin process-singleton façade mirroring the
//! spec's `Init`/`Close`/`SetCell`/... naming.

mod error;
mod pump;

pub use error::TermError;

use core_attr::Attribute;
use core_cell::CellBuffer;
use core_event::{Event, InputMode, OutputMode};
use core_term::{Backend, PlatformBackend};
use core_width::WidthContext;
use pump::Pump;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// An initialized terminal session: owns the backend, the back/front cell
/// buffers, and the event pump. Construct with [`Session::init`]; dropping
/// a `Session` restores the terminal exactly as [`Session::close`] would
/// (spec.md §9's reshape away from global init/die state).
pub struct Session {
    backend: Box<dyn Backend>,
    back: CellBuffer,
    front: CellBuffer,
    cursor: Option<(u16, u16)>,
    input_mode: InputMode,
    output_mode: OutputMode,
    width_ctx: WidthContext,
    generation: u64,
    pump: Pump,
    closed: bool,
    last_painted_cursor: Option<(u16, u16)>,
    capabilities: core_term::Capabilities,
    capabilities_generation: u64,
    needs_sync: bool,
}

impl Session {
    /// Opens the platform backend, allocates the cell buffers at the
    /// terminal's current size, and starts the background reader.
    pub fn init() -> Result<Session, TermError> {
        Session::from_backend(Box::<PlatformBackend>::default())
    }

    /// Constructs a session around a caller-supplied backend. Production
    /// code should use [`Session::init`]; this exists so tests can drive
    /// the core API against a fake backend without a real tty/console.
    pub fn from_backend(mut backend: Box<dyn Backend>) -> Result<Session, TermError> {
        let (width, height) = backend.init()?;
        let (tx, rx) = crossbeam_channel::bounded(256);
        backend.spawn_reader(tx);
        let width_ctx = backend.width_context();
        let capabilities = backend.capabilities();

        info!(target: "session", width, height, "terminal session initialized");

        Ok(Session {
            backend,
            back: CellBuffer::new(width, height),
            front: CellBuffer::new(width, height),
            cursor: None,
            input_mode: InputMode::DEFAULT,
            output_mode: OutputMode::Normal,
            width_ctx,
            generation: 0,
            pump: Pump::new(rx),
            closed: false,
            last_painted_cursor: None,
            capabilities,
            capabilities_generation: 0,
            needs_sync: false,
        })
    }

    /// Restores the terminal to its pre-`init` state. Idempotent: calling
    /// `close` twice (or letting `Drop` run after an explicit `close`) is a
    /// no-op the second time.
    pub fn close(&mut self) -> Result<(), TermError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        info!(target: "session", "terminal session closing");
        self.backend.close()?;
        Ok(())
    }

    pub fn size(&self) -> (u16, u16) {
        self.back.size()
    }

    /// Writes a rune plus attributes into the back buffer. Out-of-bounds
    /// coordinates are silently ignored (spec invariant I3).
    pub fn set_cell(&mut self, x: u16, y: u16, rune: char, fg: Attribute, bg: Attribute) {
        self.back.set_rune(x, y, rune, fg, bg, self.width_ctx);
    }

    pub fn set_bg(&mut self, x: u16, y: u16, bg: Attribute) {
        if let Some(mut cell) = self.back.get(x, y) {
            cell.bg = bg;
            self.back.set(x, y, cell);
        }
    }

    pub fn set_fg(&mut self, x: u16, y: u16, fg: Attribute) {
        if let Some(mut cell) = self.back.get(x, y) {
            cell.fg = fg;
            self.back.set(x, y, cell);
        }
    }

    pub fn set_char(&mut self, x: u16, y: u16, rune: char) {
        if let Some(cell) = self.back.get(x, y) {
            self.set_cell(x, y, rune, cell.fg, cell.bg);
        }
    }

    pub fn clear(&mut self, fg: Attribute, bg: Attribute) {
        self.back.clear(fg, bg);
    }

    /// Paints every cell, unconditionally, and blits back onto front.
    /// Shared by `flush` (when a mode change invalidated the front
    /// buffer's style assumptions) and `sync`.
    fn repaint_all(&mut self) -> Result<(), TermError> {
        let all: Vec<(u16, u16)> = (0..self.back.height())
            .flat_map(|y| (0..self.back.width()).map(move |x| (x, y)))
            .collect();
        self.backend.paint(&self.back, &all, self.cursor)?;
        self.front.blit(&self.back);
        self.last_painted_cursor = self.cursor;
        self.needs_sync = false;
        Ok(())
    }

    /// Diffs back against front, paints only the changed cells, and blits
    /// back onto front. The diff/blit pair is the minimal primitive the
    /// spec names but leaves unspecified (resolved in DESIGN.md). A prior
    /// `SetOutputMode` call forces this to fall back to a full repaint,
    /// since the front buffer's already-painted cells were encoded under
    /// the old output mode.
    pub fn flush(&mut self) -> Result<(), TermError> {
        if self.needs_sync {
            return self.repaint_all();
        }
        let changed: Vec<(u16, u16)> = self.front.diff(&self.back).collect();
        let cursor_moved = self.cursor != self.last_painted_cursor;
        if !changed.is_empty() || cursor_moved {
            self.backend.paint(&self.back, &changed, self.cursor)?;
            self.front.blit(&self.back);
            self.last_painted_cursor = self.cursor;
        }
        Ok(())
    }

    /// Re-synchronizes the front buffer with a full repaint, discarding
    /// any diff state — used after external interference with the
    /// terminal (spec P: `Sync` forces a full redraw).
    pub fn sync(&mut self) -> Result<(), TermError> {
        self.repaint_all()?;

        if self.capabilities_generation != self.generation {
            self.capabilities = self.backend.capabilities();
            self.capabilities_generation = self.generation;
            debug!(target: "session", generation = self.generation, "capabilities re-probed after resize/mode change");
        }
        Ok(())
    }

    /// The backend's last-probed capabilities (re-validated by `sync` after
    /// a resize or output-mode change bumps the generation counter).
    pub fn capabilities(&self) -> core_term::Capabilities {
        self.capabilities
    }

    pub fn set_cursor(&mut self, x: u16, y: u16) {
        self.cursor = Some((x, y));
    }

    pub fn hide_cursor(&mut self) {
        self.cursor = None;
    }

    /// Resizes both buffers, conserving in-bounds cell contents (P3).
    pub fn resize(&mut self, width: u16, height: u16) {
        self.back.resize(width, height);
        self.front.resize(width, height);
        self.generation += 1;
        debug!(target: "session", width, height, generation = self.generation, "buffers resized");
    }

    pub fn set_input_mode(&mut self, mode: InputMode) -> Result<(), TermError> {
        if !mode.contains(InputMode::CURRENT) {
            self.input_mode = mode;
        }
        self.backend.set_input_mode(mode)?;
        Ok(())
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    /// Changing output mode invalidates every cell the front buffer
    /// already thinks is painted (its bytes were encoded under the old
    /// mode), so this forces the next `flush` to do a full repaint
    /// regardless of diff (spec.md §4.C).
    pub fn set_output_mode(&mut self, mode: OutputMode) -> Result<(), TermError> {
        self.backend.set_output_mode(mode)?;
        if mode != OutputMode::Current {
            self.output_mode = mode;
            self.generation += 1;
            self.needs_sync = true;
        }
        Ok(())
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Blocks until the next event. Mirrors spec.md §4.G's FIFO merge of
    /// decoded input, resize, interrupt and fatal-error producers.
    pub fn poll_event(&self) -> Event {
        self.pump.poll()
    }

    pub fn poll_event_timeout(&self, timeout: Duration) -> Event {
        self.pump.poll_timeout(timeout)
    }

    /// Fills `buf` with raw bytes if input is available, returning
    /// `Event::Raw{n}`; otherwise behaves exactly like `poll_event`
    /// (spec.md §4.C).
    pub fn poll_raw_event(&self, buf: &mut [u8]) -> Event {
        self.pump.poll_raw(buf)
    }

    /// A handle any thread can use to make the next `poll_event` call
    /// return `Event::Interrupt`, unblocking a caller parked in it.
    pub fn interrupt_handle(&self) -> crossbeam_channel::Sender<()> {
        self.pump.interrupt_handle()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(target: "session", error = %e, "error while closing session on drop");
        }
    }
}

static SESSION: OnceLock<Mutex<Option<Session>>> = OnceLock::new();

fn slot() -> &'static Mutex<Option<Session>> {
    SESSION.get_or_init(|| Mutex::new(None))
}

fn lock_or_recover() -> std::sync::MutexGuard<'static, Option<Session>> {
    slot().lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-singleton façade: initializes the global session. Returns
/// [`TermError::InitAlready`] if one is already active.
pub fn init() -> Result<(), TermError> {
    let mut guard = lock_or_recover();
    if guard.is_some() {
        return Err(TermError::InitAlready);
    }
    *guard = Some(Session::init()?);
    Ok(())
}

/// Closes and drops the global session. [`TermError::Uninit`] if none is
/// active.
pub fn close() -> Result<(), TermError> {
    let mut guard = lock_or_recover();
    match guard.take() {
        Some(mut session) => session.close(),
        None => Err(TermError::Uninit),
    }
}

/// Runs `f` against the active global session, or returns
/// [`TermError::Uninit`] if none is active.
pub fn with_session<R>(f: impl FnOnce(&mut Session) -> R) -> Result<R, TermError> {
    let mut guard = lock_or_recover();
    match guard.as_mut() {
        Some(session) => Ok(f(session)),
        None => Err(TermError::Uninit),
    }
}
