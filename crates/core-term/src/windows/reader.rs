//! Background reader: blocks on `ReadConsoleInputW` and translates
//! `KEY_EVENT`/`MOUSE_EVENT`/`WINDOW_BUFFER_SIZE_EVENT` records into the
//! shared event vocabulary, the same one the POSIX decoder produces.

use super::console::ConsoleHandles;
use super::current_mode;
use crate::PumpSignal;
use core_event::{ErrorKind, Event, InputMode, Key, KeyPayload, Mod, MouseButton};
use crossbeam_channel::Sender;
use std::sync::Arc;
use windows_sys::Win32::System::Console::{
    ReadConsoleInputW, FROM_LEFT_1ST_BUTTON_PRESSED, INPUT_RECORD, KEY_EVENT, LEFT_ALT_PRESSED,
    MOUSE_EVENT, MOUSE_MOVED, MOUSE_WHEELED, RIGHTMOST_BUTTON_PRESSED,
    WINDOW_BUFFER_SIZE_EVENT,
};

pub fn run(handles: Arc<ConsoleHandles>, tx: Sender<PumpSignal>) {
    loop {
        let mut record: INPUT_RECORD = unsafe { std::mem::zeroed() };
        let mut read = 0u32;
        let ok = unsafe { ReadConsoleInputW(handles.stdin_handle(), &mut record, 1, &mut read) };
        if ok == 0 {
            let _ = tx.send(PumpSignal::FatalError(ErrorKind::Io));
            return;
        }
        if read == 0 {
            continue;
        }

        let signal = match record.EventType as u32 {
            KEY_EVENT => unsafe { decode_key(&record.Event.KeyEvent) },
            MOUSE_EVENT => unsafe { decode_mouse(&record.Event.MouseEvent) },
            WINDOW_BUFFER_SIZE_EVENT => unsafe {
                let size = record.Event.WindowBufferSizeEvent.dwSize;
                Some(PumpSignal::Resize(size.X as u16, size.Y as u16))
            },
            _ => None,
        };

        if let Some(signal) = signal {
            if tx.send(signal).is_err() {
                return;
            }
        }
    }
}

unsafe fn decode_key(rec: &windows_sys::Win32::System::Console::KEY_EVENT_RECORD) -> Option<PumpSignal> {
    if rec.bKeyDown == 0 {
        return None;
    }
    let mode = current_mode();
    let alt_held = rec.dwControlKeyState & LEFT_ALT_PRESSED != 0;
    let mods = if alt_held && mode.contains(InputMode::ALT) {
        Mod::Alt
    } else {
        Mod::None
    };

    let ch = char::from_u32(rec.uChar.UnicodeChar as u32).unwrap_or('\0');
    let payload = if ch != '\0' && (ch as u32) >= 0x20 && ch != '\x7f' {
        KeyPayload::Char(ch)
    } else if let Some(key) = named_key_from_vk(rec.wVirtualKeyCode) {
        KeyPayload::Named(key)
    } else if ch != '\0' {
        match Key::from_control_byte(ch as u8) {
            Some(key) => KeyPayload::Named(key),
            None => return None,
        }
    } else {
        return None;
    };

    Some(PumpSignal::Decoded(Event::Key { mods, payload }))
}

fn named_key_from_vk(vk: u16) -> Option<Key> {
    Some(match vk {
        0x25 => Key::ArrowLeft,
        0x26 => Key::ArrowUp,
        0x27 => Key::ArrowRight,
        0x28 => Key::ArrowDown,
        0x21 => Key::PgUp,
        0x22 => Key::PgDn,
        0x23 => Key::End,
        0x24 => Key::Home,
        0x2D => Key::Insert,
        0x2E => Key::Delete,
        0x70 => Key::F1,
        0x71 => Key::F2,
        0x72 => Key::F3,
        0x73 => Key::F4,
        0x74 => Key::F5,
        0x75 => Key::F6,
        0x76 => Key::F7,
        0x77 => Key::F8,
        0x78 => Key::F9,
        0x79 => Key::F10,
        0x7A => Key::F11,
        0x7B => Key::F12,
        _ => return None,
    })
}

unsafe fn decode_mouse(
    rec: &windows_sys::Win32::System::Console::MOUSE_EVENT_RECORD,
) -> Option<PumpSignal> {
    let x = rec.dwMousePosition.X.max(0) as u16;
    let y = rec.dwMousePosition.Y.max(0) as u16;

    if rec.dwEventFlags & MOUSE_WHEELED != 0 {
        let delta = (rec.dwButtonState as i32) >> 16;
        let button = if delta > 0 {
            MouseButton::WheelUp
        } else {
            MouseButton::WheelDown
        };
        return Some(PumpSignal::Decoded(Event::Mouse {
            mods: Mod::None,
            button,
            x,
            y,
        }));
    }

    let mods = if rec.dwEventFlags & MOUSE_MOVED != 0 {
        Mod::Motion
    } else {
        Mod::None
    };

    let button = if rec.dwButtonState & FROM_LEFT_1ST_BUTTON_PRESSED != 0 {
        MouseButton::Left
    } else if rec.dwButtonState & RIGHTMOST_BUTTON_PRESSED != 0 {
        MouseButton::Right
    } else if rec.dwButtonState != 0 {
        MouseButton::Middle
    } else {
        MouseButton::Release
    };

    Some(PumpSignal::Decoded(Event::Mouse { mods, button, x, y }))
}
