//! Event and key/mode types shared by the decoder, backends, and the core
//! API. Pure data — no I/O, no allocation beyond what the variants need.

use bitflags::bitflags;

/// Keyboard modifier accompanying a key or mouse event. Exactly one of
/// these applies at a time (a chorded Ctrl+Alt is out of scope, matching
/// the source API this is grounded on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mod {
    #[default]
    None,
    Alt,
    /// Set on mouse-motion (drag) reports.
    Motion,
}

/// Named function/control keys. Printable characters are carried instead
/// via [`KeyPayload::Char`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[rustfmt::skip]
pub enum Key {
    Esc, Enter, Tab, Backspace, Backspace2, Space,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
    Insert, Delete, Home, End, PgUp, PgDn,
    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    CtrlA, CtrlB, CtrlC, CtrlD, CtrlE, CtrlF, CtrlG, CtrlH, CtrlI, CtrlJ,
    CtrlK, CtrlL, CtrlM, CtrlN, CtrlO, CtrlP, CtrlQ, CtrlR, CtrlS, CtrlT,
    CtrlU, CtrlV, CtrlW, CtrlX, CtrlY, CtrlZ,
}

impl Key {
    /// Maps a C0 control byte (0x00-0x1F) to its named key, if one exists
    /// distinct from a plain `Ctrl<letter>` combination (Tab, Enter,
    /// Backspace, Esc all arrive as control bytes but have dedicated
    /// names per spec.md §4.D rule 5).
    pub fn from_control_byte(b: u8) -> Option<Key> {
        Some(match b {
            0x01 => Key::CtrlA,
            0x02 => Key::CtrlB,
            0x03 => Key::CtrlC,
            0x04 => Key::CtrlD,
            0x05 => Key::CtrlE,
            0x06 => Key::CtrlF,
            0x07 => Key::CtrlG,
            0x08 => Key::Backspace2,
            0x09 => Key::Tab,
            0x0A => Key::CtrlJ,
            0x0B => Key::CtrlK,
            0x0C => Key::CtrlL,
            0x0D => Key::Enter,
            0x0E => Key::CtrlN,
            0x0F => Key::CtrlO,
            0x10 => Key::CtrlP,
            0x11 => Key::CtrlQ,
            0x12 => Key::CtrlR,
            0x13 => Key::CtrlS,
            0x14 => Key::CtrlT,
            0x15 => Key::CtrlU,
            0x16 => Key::CtrlV,
            0x17 => Key::CtrlW,
            0x18 => Key::CtrlX,
            0x19 => Key::CtrlY,
            0x1A => Key::CtrlZ,
            0x1B => Key::Esc,
            0x7F => Key::Backspace,
            0x20 => Key::Space,
            _ => return None,
        })
    }
}

/// Exactly one of a named key or a Unicode scalar applies to any key
/// press (spec.md §3 `Key{mod, key, ch}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPayload {
    Named(Key),
    Char(char),
}

/// Mouse button or wheel direction identified in a `Mouse` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Release,
    WheelUp,
    WheelDown,
}

/// Coarse classification of a fatal backend error, surfaced via
/// `Event::Error`. `Session`'s richer `TermError` (see `core-terminal`)
/// carries the underlying `std::io::Error`/message; this is the
/// `Copy`-able tag threaded through the event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    Unsupported,
}

/// One input transition delivered by `PollEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Key {
        mods: Mod,
        payload: KeyPayload,
    },
    Resize {
        width: u16,
        height: u16,
    },
    Mouse {
        mods: Mod,
        button: MouseButton,
        x: u16,
        y: u16,
    },
    Interrupt,
    /// Raw bytes were delivered into the caller's buffer (see
    /// `PollRawEvent`); `n` is how many bytes were written.
    Raw {
        n: usize,
    },
    Error {
        kind: ErrorKind,
    },
    None,
}

bitflags! {
    /// Bitmask of input-parsing policy bits. `ESC` and `ALT` are mutually
    /// exclusive (spec.md §9 mandates XOR, resolving the source's
    /// undefined behavior for setting both); `CURRENT` is a sentinel a
    /// caller passes to `SetInputMode` to query without changing anything
    /// and is never the session's stored mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputMode: u8 {
        const ESC     = 0b0001;
        const ALT     = 0b0010;
        const MOUSE   = 0b0100;
        const CURRENT = 0b1000;
    }
}

impl InputMode {
    /// The default mode after `Init`: lone ESC is a key, mouse tracking
    /// off.
    pub const DEFAULT: InputMode = InputMode::ESC;

    /// True if this mode (ignoring `CURRENT`) names a policy — i.e. isn't
    /// just the `CURRENT` query sentinel.
    pub fn is_concrete(self) -> bool {
        !self.contains(InputMode::CURRENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn esc_and_alt_are_distinct_bits() {
        assert_ne!(InputMode::ESC, InputMode::ALT);
        assert!(!(InputMode::ESC | InputMode::MOUSE).contains(InputMode::ALT));
    }

    #[test]
    fn control_bytes_map_to_named_keys_not_chars() {
        assert_eq!(Key::from_control_byte(0x0D), Some(Key::Enter));
        assert_eq!(Key::from_control_byte(0x09), Some(Key::Tab));
        assert_eq!(Key::from_control_byte(0x7F), Some(Key::Backspace));
        assert_eq!(Key::from_control_byte(0x03), Some(Key::CtrlC));
        assert_eq!(Key::from_control_byte(b'x'), None);
    }

    #[test]
    fn current_sentinel_is_not_concrete() {
        assert!(!InputMode::CURRENT.is_concrete());
        assert!(InputMode::ESC.is_concrete());
    }
}
