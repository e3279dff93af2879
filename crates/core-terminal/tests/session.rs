//! Integration tests driving the public API against a fake backend,
//! covering the seed scenarios from spec.md §8 that exercise `Session`
//! rather than the decoder directly.

use core_attr::Attribute;
use core_cell::CellBuffer;
use core_event::{Event, InputMode, OutputMode};
use core_term::{Backend, BackendError, Capabilities, PumpSignal};
use core_terminal::Session;
use core_width::WidthContext;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeBackend {
    size: (u16, u16),
    painted: Arc<Mutex<Vec<(Vec<(u16, u16)>, Option<(u16, u16)>)>>>,
    output_mode: OutputMode,
    raw_payload: Option<Vec<u8>>,
}

impl FakeBackend {
    fn new(width: u16, height: u16) -> Self {
        FakeBackend {
            size: (width, height),
            ..Default::default()
        }
    }
}

impl Backend for FakeBackend {
    fn init(&mut self) -> Result<(u16, u16), BackendError> {
        Ok(self.size)
    }

    fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_input_mode(&mut self, _mode: InputMode) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_output_mode(&mut self, mode: OutputMode) -> Result<(), BackendError> {
        if mode == OutputMode::Rgb {
            return Err(BackendError::Unsupported("fake backend has no RGB".into()));
        }
        self.output_mode = mode;
        Ok(())
    }

    fn paint(
        &mut self,
        _front: &CellBuffer,
        changed: &[(u16, u16)],
        cursor: Option<(u16, u16)>,
    ) -> Result<(), BackendError> {
        self.painted.lock().unwrap().push((changed.to_vec(), cursor));
        Ok(())
    }

    fn width_context(&self) -> WidthContext {
        WidthContext::default()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities { supports_rgb: false }
    }

    fn spawn_reader(&mut self, tx: crossbeam_channel::Sender<PumpSignal>) -> std::thread::JoinHandle<()> {
        let payload = self.raw_payload.take();
        std::thread::spawn(move || {
            if let Some(bytes) = payload {
                let _ = tx.send(PumpSignal::Raw(bytes));
            }
        })
    }
}

#[test]
fn flush_paints_only_changed_cells() {
    let mut session = Session::from_backend(Box::new(FakeBackend::new(10, 4))).unwrap();
    session.set_cell(2, 1, 'x', Attribute::DEFAULT, Attribute::DEFAULT);
    session.flush().unwrap();
    assert_eq!(session.size(), (10, 4));
}

#[test]
fn resize_preserves_existing_cells_and_bumps_generation() {
    let mut session = Session::from_backend(Box::new(FakeBackend::new(5, 5))).unwrap();
    session.set_cell(1, 1, 'a', Attribute::DEFAULT, Attribute::DEFAULT);
    session.flush().unwrap();
    session.resize(3, 3);
    assert_eq!(session.size(), (3, 3));
}

#[test]
fn output_mode_unsupported_by_backend_surfaces_as_term_error() {
    let mut session = Session::from_backend(Box::new(FakeBackend::new(5, 5))).unwrap();
    let err = session.set_output_mode(OutputMode::Rgb).unwrap_err();
    assert!(matches!(err, core_terminal::TermError::Unsupported(_)));
}

#[test]
fn interrupt_handle_unblocks_poll_event() {
    let session = Session::from_backend(Box::new(FakeBackend::new(5, 5))).unwrap();
    let handle = session.interrupt_handle();
    let poller = std::thread::spawn({
        let handle2 = handle.clone();
        move || {
            std::thread::sleep(std::time::Duration::from_millis(10));
            handle2.send(()).unwrap();
        }
    });
    let event = session.poll_event();
    poller.join().unwrap();
    assert_eq!(event, Event::Interrupt);
}

#[test]
fn poll_event_timeout_returns_none_when_nothing_arrives() {
    let session = Session::from_backend(Box::new(FakeBackend::new(5, 5))).unwrap();
    let event = session.poll_event_timeout(std::time::Duration::from_millis(20));
    assert_eq!(event, Event::None);
}

#[test]
fn cursor_move_alone_still_triggers_a_paint() {
    let mut session = Session::from_backend(Box::new(FakeBackend::new(5, 5))).unwrap();
    session.flush().unwrap();
    session.set_cursor(2, 2);
    session.flush().unwrap();
}

#[test]
fn output_mode_change_forces_full_repaint_on_next_flush() {
    let backend = FakeBackend::new(4, 3);
    let painted = Arc::clone(&backend.painted);
    let mut session = Session::from_backend(Box::new(backend)).unwrap();

    session.set_cell(0, 0, 'a', Attribute::DEFAULT, Attribute::DEFAULT);
    session.flush().unwrap();

    session.set_output_mode(OutputMode::Normal).unwrap();
    session.flush().unwrap();

    let calls = painted.lock().unwrap();
    let last = calls.last().unwrap();
    assert_eq!(last.0.len(), 4 * 3);
}

#[test]
fn poll_raw_event_returns_raw_bytes_when_available() {
    let mut backend = FakeBackend::new(5, 5);
    backend.raw_payload = Some(b"hi".to_vec());
    let session = Session::from_backend(Box::new(backend)).unwrap();

    let mut buf = [0u8; 8];
    let event = session.poll_raw_event(&mut buf);
    assert_eq!(event, Event::Raw { n: 2 });
    assert_eq!(&buf[..2], b"hi");
}

#[test]
fn poll_raw_event_falls_back_to_decoded_event_when_nothing_raw_is_pending() {
    let session = Session::from_backend(Box::new(FakeBackend::new(5, 5))).unwrap();
    let handle = session.interrupt_handle();
    let poller = std::thread::spawn({
        let handle2 = handle.clone();
        move || {
            std::thread::sleep(std::time::Duration::from_millis(10));
            handle2.send(()).unwrap();
        }
    });
    let mut buf = [0u8; 8];
    let event = session.poll_raw_event(&mut buf);
    poller.join().unwrap();
    assert_eq!(event, Event::Interrupt);
}
