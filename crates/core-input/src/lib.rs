//! The input decoder: a pure function `(bytes, mode) -> (Event, N)` where
//! `N` is the number of bytes consumed, `0` meaning "need more bytes"
//! (spec.md §4.D). No I/O, no allocation on the hot path, never blocks,
//! never misaligns on partial input.

pub mod key_table;

use core_event::{Event, InputMode, Key, KeyPayload, Mod, MouseButton};
use key_table::KEY_TABLE;

const ESC: u8 = 0x1B;

/// Result of trying to match a prefix-delimited sub-grammar (mouse
/// reports, the function-key table) against the current bytes.
enum Lookahead {
    /// Definitely not this grammar; try the next precedence rule.
    NoMatch,
    /// Could still become a match with more bytes; caller must wait.
    Incomplete,
    /// A full match consuming `n` bytes.
    Match(Event, usize),
}

/// Parse the next event out of `bytes` under the current `mode`.
///
/// Returns `(Event::None, 0)` when `bytes` holds an incomplete prefix and
/// the caller should accumulate more input before calling again. Never
/// panics and always makes forward progress on well-formed streams,
/// matching spec.md's precedence order:
/// 1. CSI mouse (legacy or SGR).
/// 2. Known function-key / cursor sequence (longest match).
/// 3. Alt-modified rune (`InputMode::ALT`).
/// 4. Lone ESC (`InputMode::ESC`).
/// 5. A single UTF-8 scalar, or a named key for C0 control bytes.
pub fn parse_event(bytes: &[u8], mode: InputMode) -> (Event, usize) {
    if bytes.is_empty() {
        return (Event::None, 0);
    }

    if bytes[0] == ESC {
        if bytes.len() == 1 {
            // Ambiguous: could be a standalone Esc press or the start of
            // an Alt-modified rune / escape sequence that just hasn't
            // arrived yet. In Alt mode we wait (the event pump applies
            // the spec.md §5 50ms timeout via `resolve_lone_esc_timeout`);
            // in Esc mode the spec resolves immediately.
            return if mode.contains(InputMode::ALT) {
                (Event::None, 0)
            } else {
                (key_event(Mod::None, KeyPayload::Named(Key::Esc)), 1)
            };
        }

        match try_mouse(bytes) {
            Lookahead::Match(ev, n) => return (ev, n),
            Lookahead::Incomplete => return (Event::None, 0),
            Lookahead::NoMatch => {}
        }

        match try_function_key(bytes) {
            Lookahead::Match(ev, n) => return (ev, n),
            Lookahead::Incomplete => return (Event::None, 0),
            Lookahead::NoMatch => {}
        }

        if mode.contains(InputMode::ALT) {
            match decode_utf8(&bytes[1..]) {
                Utf8Decode::Complete(ch, n) => {
                    return (key_event(Mod::Alt, KeyPayload::Char(ch)), 1 + n);
                }
                Utf8Decode::Incomplete => return (Event::None, 0),
                Utf8Decode::Invalid => {} // fall through: treat leading ESC as lone Esc
            }
        }

        // Nothing recognized the continuation: the ESC stands alone.
        return (key_event(Mod::None, KeyPayload::Named(Key::Esc)), 1);
    }

    let b0 = bytes[0];
    if b0 < 0x20 || b0 == 0x7F {
        return match Key::from_control_byte(b0) {
            Some(k) => (key_event(Mod::None, KeyPayload::Named(k)), 1),
            // Unmapped C0 byte: surface rather than silently drop.
            None => (key_event(Mod::None, KeyPayload::Char(b0 as char)), 1),
        };
    }

    match decode_utf8(bytes) {
        Utf8Decode::Complete(ch, n) => (key_event(Mod::None, KeyPayload::Char(ch)), n),
        Utf8Decode::Incomplete => (Event::None, 0),
        Utf8Decode::Invalid => (
            key_event(Mod::None, KeyPayload::Char(char::REPLACEMENT_CHARACTER)),
            1,
        ),
    }
}

/// Forces an unresolved lone ESC to resolve as `Key::Esc` after the event
/// pump's input-mode-Alt timeout elapses with no follow-up byte (spec.md
/// §4.D rule 4, §5's 50ms constant). `bytes` must be exactly `[0x1B]`;
/// returns `None` otherwise (nothing to resolve).
pub fn resolve_lone_esc_timeout(bytes: &[u8]) -> Option<(Event, usize)> {
    if bytes == [ESC] {
        Some((key_event(Mod::None, KeyPayload::Named(Key::Esc)), 1))
    } else {
        None
    }
}

fn key_event(mods: Mod, payload: KeyPayload) -> Event {
    Event::Key { mods, payload }
}

enum Utf8Decode {
    Complete(char, usize),
    Incomplete,
    Invalid,
}

fn utf8_len(b0: u8) -> Option<usize> {
    if b0 < 0x80 {
        Some(1)
    } else if b0 & 0xE0 == 0xC0 {
        Some(2)
    } else if b0 & 0xF0 == 0xE0 {
        Some(3)
    } else if b0 & 0xF8 == 0xF0 {
        Some(4)
    } else {
        None
    }
}

fn decode_utf8(bytes: &[u8]) -> Utf8Decode {
    let Some(&b0) = bytes.first() else {
        return Utf8Decode::Incomplete;
    };
    let Some(len) = utf8_len(b0) else {
        return Utf8Decode::Invalid;
    };
    if bytes.len() < len {
        return Utf8Decode::Incomplete;
    }
    match std::str::from_utf8(&bytes[..len]) {
        Ok(s) => match s.chars().next() {
            Some(ch) => Utf8Decode::Complete(ch, len),
            None => Utf8Decode::Invalid,
        },
        Err(_) => Utf8Decode::Invalid,
    }
}

/// `bytes[0] == ESC`, `bytes.len() >= 2`.
fn try_mouse(bytes: &[u8]) -> Lookahead {
    if bytes[1] != b'[' {
        return Lookahead::NoMatch;
    }
    if bytes.len() < 3 {
        return Lookahead::Incomplete;
    }
    match bytes[2] {
        b'M' => {
            // Legacy X10/xterm mouse: ESC [ M Cb Cx Cy.
            if bytes.len() < 6 {
                return Lookahead::Incomplete;
            }
            let (button, mods) = decode_button_bits(bytes[3].wrapping_sub(32) as u32);
            let x = (bytes[4] as i32 - 32 - 1).max(0) as u16;
            let y = (bytes[5] as i32 - 32 - 1).max(0) as u16;
            Lookahead::Match(Event::Mouse { mods, button, x, y }, 6)
        }
        b'<' => try_sgr_mouse(bytes),
        _ => Lookahead::NoMatch,
    }
}

fn try_sgr_mouse(bytes: &[u8]) -> Lookahead {
    let mut i = 3;
    loop {
        if i >= bytes.len() {
            return Lookahead::Incomplete;
        }
        match bytes[i] {
            b'M' | b'm' => break,
            b'0'..=b'9' | b';' => i += 1,
            _ => return Lookahead::NoMatch,
        }
        if i - 3 > 32 {
            return Lookahead::NoMatch;
        }
    }
    let terminator = bytes[i];
    let Some((b, x, y)) = parse_sgr_params(&bytes[3..i]) else {
        return Lookahead::NoMatch;
    };
    let (mut button, mods) = decode_button_bits(b);
    if terminator == b'm' {
        button = MouseButton::Release;
    }
    let x = x.saturating_sub(1) as u16;
    let y = y.saturating_sub(1) as u16;
    Lookahead::Match(Event::Mouse { mods, button, x, y }, i + 1)
}

fn parse_sgr_params(bytes: &[u8]) -> Option<(u32, u32, u32)> {
    let s = std::str::from_utf8(bytes).ok()?;
    let mut parts = s.split(';');
    let b: u32 = parts.next()?.parse().ok()?;
    let x: u32 = parts.next()?.parse().ok()?;
    let y: u32 = parts.next()?.parse().ok()?;
    Some((b, x, y))
}

/// Shared legacy/SGR button-bits decoding: bit 0x40 marks wheel events,
/// bit 0x20 marks drag/motion, the low 2 bits name button or release.
fn decode_button_bits(v: u32) -> (MouseButton, Mod) {
    let mods = if v & 0x20 != 0 { Mod::Motion } else { Mod::None };
    if v & 0x40 != 0 {
        let button = if v & 1 == 0 {
            MouseButton::WheelUp
        } else {
            MouseButton::WheelDown
        };
        return (button, mods);
    }
    let button = match v & 0x3 {
        0 => MouseButton::Left,
        1 => MouseButton::Middle,
        2 => MouseButton::Right,
        _ => MouseButton::Release,
    };
    (button, mods)
}

/// `bytes[0] == ESC`, `bytes.len() >= 2`. Longest-match over
/// [`KEY_TABLE`]; returns `Incomplete` whenever some table entry longer
/// than `bytes` still has `bytes` as a prefix, so the caller waits for
/// more data instead of committing to a shorter, possibly wrong, match.
fn try_function_key(bytes: &[u8]) -> Lookahead {
    let mut best: Option<(&'static [u8], Key)> = None;
    let mut could_extend = false;
    for &(seq, key) in KEY_TABLE {
        if bytes.len() >= seq.len() && bytes.starts_with(seq) {
            let better = match best {
                Some((b, _)) => seq.len() > b.len(),
                None => true,
            };
            if better {
                best = Some((seq, key));
            }
        } else if seq.len() > bytes.len() && seq.starts_with(bytes) {
            could_extend = true;
        }
    }
    if could_extend {
        return Lookahead::Incomplete;
    }
    match best {
        Some((seq, key)) => Lookahead::Match(key_event(Mod::None, KeyPayload::Named(key)), seq.len()),
        None => Lookahead::NoMatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn esc_mode() -> InputMode {
        InputMode::ESC
    }

    fn alt_mode() -> InputMode {
        InputMode::ALT
    }

    #[test]
    fn scenario_arrow_up() {
        let (ev, n) = parse_event(b"\x1b[A", esc_mode());
        assert_eq!(n, 3);
        assert_eq!(
            ev,
            Event::Key {
                mods: Mod::None,
                payload: KeyPayload::Named(Key::ArrowUp)
            }
        );
    }

    #[test]
    fn scenario_sgr_mouse_left_click() {
        let (ev, n) = parse_event(b"\x1b[<0;10;20M", InputMode::ESC | InputMode::MOUSE);
        assert_eq!(n, 11);
        assert_eq!(
            ev,
            Event::Mouse {
                mods: Mod::None,
                button: MouseButton::Left,
                x: 9,
                y: 19,
            }
        );
    }

    #[test]
    fn scenario_lone_esc_in_esc_mode_resolves_immediately() {
        let (ev, n) = parse_event(b"\x1b", esc_mode());
        assert_eq!(n, 1);
        assert_eq!(
            ev,
            Event::Key {
                mods: Mod::None,
                payload: KeyPayload::Named(Key::Esc)
            }
        );
    }

    #[test]
    fn scenario_lone_esc_in_alt_mode_is_incomplete_until_timeout() {
        let (ev, n) = parse_event(b"\x1b", alt_mode());
        assert_eq!((ev, n), (Event::None, 0));
        let (ev, n) = resolve_lone_esc_timeout(b"\x1b").unwrap();
        assert_eq!(n, 1);
        assert_eq!(
            ev,
            Event::Key {
                mods: Mod::None,
                payload: KeyPayload::Named(Key::Esc)
            }
        );
    }

    #[test]
    fn scenario_alt_modified_rune() {
        let (ev, n) = parse_event(b"\x1ba", alt_mode());
        assert_eq!(n, 2);
        assert_eq!(
            ev,
            Event::Key {
                mods: Mod::Alt,
                payload: KeyPayload::Char('a')
            }
        );
    }

    #[test]
    fn control_bytes_become_named_keys() {
        let (ev, n) = parse_event(b"\r", esc_mode());
        assert_eq!(n, 1);
        assert_eq!(
            ev,
            Event::Key {
                mods: Mod::None,
                payload: KeyPayload::Named(Key::Enter)
            }
        );
    }

    #[test]
    fn plain_utf8_scalar() {
        let (ev, n) = parse_event("é".as_bytes(), esc_mode());
        assert_eq!(n, 2);
        assert_eq!(
            ev,
            Event::Key {
                mods: Mod::None,
                payload: KeyPayload::Char('é')
            }
        );
    }

    #[test]
    fn every_strict_prefix_of_a_canonical_sequence_is_incomplete() {
        let canonical: &[u8] = b"\x1b[A";
        for n in 0..canonical.len() {
            let (ev, consumed) = parse_event(&canonical[..n], esc_mode());
            assert_eq!((ev, consumed), (Event::None, 0), "prefix len {n}");
        }
    }

    #[test]
    fn ambiguous_numeric_csi_prefix_waits_for_more_bytes() {
        // "\e[1" is a shared prefix of Home ("\e[1~") and F1 ("\e[11~").
        let (ev, n) = parse_event(b"\x1b[1", esc_mode());
        assert_eq!((ev, n), (Event::None, 0));
        let (ev, n) = parse_event(b"\x1b[1~", esc_mode());
        assert_eq!(n, 4);
        assert_eq!(
            ev,
            Event::Key {
                mods: Mod::None,
                payload: KeyPayload::Named(Key::Home)
            }
        );
    }

    #[test]
    fn empty_input_is_incomplete() {
        assert_eq!(parse_event(b"", esc_mode()), (Event::None, 0));
    }
}
