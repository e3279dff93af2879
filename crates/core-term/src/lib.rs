//! Backend abstraction translating cell-grid mutations to/from bytes.
//!
//! Two concrete backends exist behind a single [`Backend`] trait: a POSIX
//! backend (raw `termios`, ANSI/xterm escape sequences) and a Windows
//! console backend (Win32 console API). Module selection follows the
//! teacher's `tty/mod.rs` convention of cfg-gating whole submodules rather
//! than sprinkling `#[cfg]` through shared logic.

use core_cell::CellBuffer;
use core_event::{Event, InputMode, OutputMode};
use core_width::WidthContext;
use crossbeam_channel as mpsc;
use thiserror::Error;

/// Backend-reported capabilities consulted by the core API (and, in a
/// faithful port of a full editor, by a render scheduler — here consumed
/// directly by `core-terminal`'s `Flush`/`Sync`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Full 24-bit RGB can be emitted (POSIX: always; Windows: only once
    /// `ENABLE_VIRTUAL_TERMINAL_PROCESSING` is confirmed).
    pub supports_rgb: bool,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("output mode not supported by this backend: {0}")]
    Unsupported(String),
}

/// Events a backend's producers (reader thread, resize notifier) push
/// toward the core API's event pump. Distinct from `core_event::Event`
/// because resize/fatal-error need pump-level coalescing/handling before
/// becoming the public `Event` the application sees.
#[derive(Debug, Clone)]
pub enum PumpSignal {
    Decoded(Event),
    Resize(u16, u16),
    FatalError(core_event::ErrorKind),
    /// Bytes read straight off the wire before decoding, for `PollRawEvent`
    /// (spec.md §4.C). Ignored by the ordinary decoded-event poll path.
    Raw(Vec<u8>),
}

/// A translator between the abstract cell grid / cursor / modes and a
/// concrete terminal (POSIX tty or Windows console).
///
/// Implementations own their OS resources for the session's lifetime;
/// `close` must be safe to call from a signal/interrupt context and must
/// restore state even if `init` never fully completed (spec.md §4.C).
pub trait Backend: Send {
    /// Open the device, query size, install resize/interrupt plumbing.
    /// Returns the initial `(width, height)`.
    fn init(&mut self) -> Result<(u16, u16), BackendError>;

    /// Restore original terminal/console state. Idempotent.
    fn close(&mut self) -> Result<(), BackendError>;

    /// Apply a new input mode (mouse tracking on/off, etc).
    fn set_input_mode(&mut self, mode: InputMode) -> Result<(), BackendError>;

    /// Apply a new output mode. Returns `Unsupported` if the backend
    /// cannot represent it (spec.md §7) rather than silently downgrading
    /// when the caller asked for it explicitly.
    fn set_output_mode(&mut self, mode: OutputMode) -> Result<(), BackendError>;

    /// Paint every cell at the given coordinates (row-major order is the
    /// caller's responsibility) from `front`, then position the cursor.
    /// `cursor = None` means hidden.
    fn paint(
        &mut self,
        front: &CellBuffer,
        changed: &[(u16, u16)],
        cursor: Option<(u16, u16)>,
    ) -> Result<(), BackendError>;

    /// Current width-oracle context (CJK ambiguous-width policy).
    fn width_context(&self) -> WidthContext;

    /// Backend-reported capabilities.
    fn capabilities(&self) -> Capabilities;

    /// Spawn the background input reader (and, on POSIX, the resize
    /// signal listener) feeding `tx`. Returns a join handle the caller
    /// awaits during `close`.
    fn spawn_reader(&mut self, tx: mpsc::Sender<PumpSignal>) -> std::thread::JoinHandle<()>;
}

#[cfg(unix)]
pub mod unix;
#[cfg(unix)]
pub use unix::PosixBackend as PlatformBackend;

#[cfg(windows)]
pub mod windows;
#[cfg(windows)]
pub use windows::ConsoleBackend as PlatformBackend;
