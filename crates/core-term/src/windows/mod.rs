//! Windows console backend: `SetConsoleMode`/`GetConsoleMode` for raw input,
//! `WriteConsoleOutputW` for diff-driven painting, `ReadConsoleInputW` for
//! the reader thread. VT processing is requested opportunistically; when
//! unavailable the composer downgrades full RGB to the nearest of the 16
//! named colors rather than emitting escape sequences the console can't
//! interpret.

mod composer;
mod console;
mod reader;

use crate::{Backend, BackendError, Capabilities, PumpSignal};
use composer::Composer;
use console::ConsoleHandles;
use core_cell::CellBuffer;
use core_event::{InputMode, OutputMode};
use core_width::WidthContext;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use crossbeam_channel::Sender;
use std::sync::Arc;
use tracing::debug;

static MODE_BITS: AtomicU8 = AtomicU8::new(InputMode::DEFAULT.bits());
static VT_SUPPORTED: AtomicBool = AtomicBool::new(false);

pub(crate) fn current_mode() -> InputMode {
    InputMode::from_bits_truncate(MODE_BITS.load(Ordering::Relaxed))
}

pub struct ConsoleBackend {
    handles: Option<Arc<ConsoleHandles>>,
    composer: Composer,
    output_mode: OutputMode,
    mouse_enabled: bool,
    reader_handle: Option<std::thread::JoinHandle<()>>,
}

impl Default for ConsoleBackend {
    fn default() -> Self {
        ConsoleBackend {
            handles: None,
            composer: Composer::new(OutputMode::Normal),
            output_mode: OutputMode::Normal,
            mouse_enabled: false,
            reader_handle: None,
        }
    }
}

impl Backend for ConsoleBackend {
    fn init(&mut self) -> Result<(u16, u16), BackendError> {
        let handles = ConsoleHandles::acquire()?;
        let vt = handles.enable_virtual_terminal_processing().unwrap_or(false);
        VT_SUPPORTED.store(vt, Ordering::Relaxed);
        let size = handles.buffer_size()?;
        self.handles = Some(Arc::new(handles));
        debug!(width = size.0, height = size.1, vt, "console backend initialized");
        Ok(size)
    }

    fn close(&mut self) -> Result<(), BackendError> {
        if let Some(handles) = self.handles.take() {
            handles.restore()?;
        }
        if let Some(h) = self.reader_handle.take() {
            let _ = h.join();
        }
        Ok(())
    }

    fn set_input_mode(&mut self, mode: InputMode) -> Result<(), BackendError> {
        if mode.contains(InputMode::CURRENT) {
            return Ok(());
        }
        MODE_BITS.store(mode.bits(), Ordering::Relaxed);
        let handles = self
            .handles
            .as_ref()
            .ok_or_else(|| BackendError::Unsupported("backend not initialized".into()))?;
        let want_mouse = mode.contains(InputMode::MOUSE);
        if want_mouse != self.mouse_enabled {
            handles.set_mouse_input(want_mouse)?;
            self.mouse_enabled = want_mouse;
        }
        Ok(())
    }

    fn set_output_mode(&mut self, mode: OutputMode) -> Result<(), BackendError> {
        if mode == OutputMode::Current {
            return Ok(());
        }
        if mode == OutputMode::Rgb && !VT_SUPPORTED.load(Ordering::Relaxed) {
            return Err(BackendError::Unsupported(
                "24-bit RGB requires virtual terminal processing, unavailable on this console"
                    .into(),
            ));
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
        let handles = self
            .handles
            .as_ref()
            .ok_or_else(|| BackendError::Unsupported("backend not initialized".into()))?;
        self.composer.compose(handles, front, changed, cursor)
    }

    fn width_context(&self) -> WidthContext {
        WidthContext {
            ambiguous_is_wide: false,
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_rgb: VT_SUPPORTED.load(Ordering::Relaxed),
        }
    }

    fn spawn_reader(&mut self, tx: Sender<PumpSignal>) -> std::thread::JoinHandle<()> {
        let handles = Arc::clone(self.handles.as_ref().expect("spawn_reader called before init"));
        std::thread::spawn(move || reader::run(handles, tx))
    }
}
