//! Compile-time xterm function-key escape table (spec.md §9: "represent as
//! a compile-time table with runtime fallback to a safe xterm-default
//! entry"). `$TERM`-specific terminfo lookups, when available, are tried
//! first by the POSIX backend before falling back to this table; the
//! table itself never changes at runtime.

use core_event::Key;

/// `(byte sequence, key)` pairs. Order does not matter for correctness —
/// [`crate::try_function_key`] picks the longest sequence that is a
/// prefix of the input, not the first textual match — but entries are
/// grouped by family for readability.
pub const KEY_TABLE: &[(&[u8], Key)] = &[
    // Cursor keys, application and normal mode.
    (b"\x1b[A", Key::ArrowUp),
    (b"\x1b[B", Key::ArrowDown),
    (b"\x1b[C", Key::ArrowRight),
    (b"\x1b[D", Key::ArrowLeft),
    (b"\x1bOA", Key::ArrowUp),
    (b"\x1bOB", Key::ArrowDown),
    (b"\x1bOC", Key::ArrowRight),
    (b"\x1bOD", Key::ArrowLeft),
    // Home/End, both VT and xterm forms.
    (b"\x1b[H", Key::Home),
    (b"\x1b[F", Key::End),
    (b"\x1bOH", Key::Home),
    (b"\x1bOF", Key::End),
    (b"\x1b[1~", Key::Home),
    (b"\x1b[4~", Key::End),
    // Insert/Delete/PgUp/PgDn.
    (b"\x1b[2~", Key::Insert),
    (b"\x1b[3~", Key::Delete),
    (b"\x1b[5~", Key::PgUp),
    (b"\x1b[6~", Key::PgDn),
    // Function keys F1-F4, SS3 and CSI forms.
    (b"\x1bOP", Key::F1),
    (b"\x1bOQ", Key::F2),
    (b"\x1bOR", Key::F3),
    (b"\x1bOS", Key::F4),
    (b"\x1b[11~", Key::F1),
    (b"\x1b[12~", Key::F2),
    (b"\x1b[13~", Key::F3),
    (b"\x1b[14~", Key::F4),
    // Function keys F5-F12.
    (b"\x1b[15~", Key::F5),
    (b"\x1b[17~", Key::F6),
    (b"\x1b[18~", Key::F7),
    (b"\x1b[19~", Key::F8),
    (b"\x1b[20~", Key::F9),
    (b"\x1b[21~", Key::F10),
    (b"\x1b[23~", Key::F11),
    (b"\x1b[24~", Key::F12),
];
