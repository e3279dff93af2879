//! FIFO merge of the backend's reader/resize/error producer with the
//! session's own interrupt signal, per spec.md §4.G. A plain
//! `crossbeam_channel::select!` rather than an async runtime — see
//! `core_term`'s module doc for the rationale.

use core_event::Event;
use core_term::PumpSignal;
use crossbeam_channel::{Receiver, Sender};
use std::time::{Duration, Instant};

pub struct Pump {
    signals: Receiver<PumpSignal>,
    interrupt_rx: Receiver<()>,
    interrupt_tx: Sender<()>,
}

impl Pump {
    pub fn new(signals: Receiver<PumpSignal>) -> Self {
        let (interrupt_tx, interrupt_rx) = crossbeam_channel::bounded(1);
        Pump {
            signals,
            interrupt_rx,
            interrupt_tx,
        }
    }

    /// A cloneable handle that, when sent to, makes the next (or
    /// in-flight) `poll`/`poll_timeout` call return `Event::Interrupt`.
    pub fn interrupt_handle(&self) -> Sender<()> {
        self.interrupt_tx.clone()
    }

    /// Blocks until the next decoded event, resize, error, or interrupt.
    /// `PumpSignal::Raw` carries no decoded event of its own, so it is
    /// skipped rather than surfaced here — `poll_raw` is the consumer for it.
    pub fn poll(&self) -> Event {
        loop {
            crossbeam_channel::select! {
                recv(self.interrupt_rx) -> _ => return Event::Interrupt,
                recv(self.signals) -> msg => {
                    if let Some(event) = translate(msg) {
                        return event;
                    }
                }
            }
        }
    }

    pub fn poll_timeout(&self, timeout: Duration) -> Event {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            crossbeam_channel::select! {
                recv(self.interrupt_rx) -> _ => return Event::Interrupt,
                recv(self.signals) -> msg => {
                    if let Some(event) = translate(msg) {
                        return event;
                    }
                }
                default(remaining) => return Event::None,
            }
        }
    }

    /// Fills `buf` with raw bytes and returns `Event::Raw{n}` if the next
    /// pump message is a raw chunk; otherwise behaves exactly like `poll`
    /// (spec.md §4.C `PollRawEvent`).
    pub fn poll_raw(&self, buf: &mut [u8]) -> Event {
        crossbeam_channel::select! {
            recv(self.interrupt_rx) -> _ => Event::Interrupt,
            recv(self.signals) -> msg => match msg {
                Ok(PumpSignal::Raw(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Event::Raw { n }
                }
                other => translate(other).unwrap_or(Event::None),
            },
        }
    }
}

/// `None` means "not a decoded event" (currently only `PumpSignal::Raw`,
/// which `poll`/`poll_timeout` skip over and `poll_raw` handles directly).
fn translate(msg: Result<PumpSignal, crossbeam_channel::RecvError>) -> Option<Event> {
    match msg {
        Ok(PumpSignal::Decoded(event)) => Some(event),
        Ok(PumpSignal::Resize(width, height)) => Some(Event::Resize { width, height }),
        Ok(PumpSignal::FatalError(kind)) => Some(Event::Error { kind }),
        Ok(PumpSignal::Raw(_)) => None,
        Err(_) => Some(Event::None),
    }
}
