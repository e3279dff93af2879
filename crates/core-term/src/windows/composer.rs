//! Windows paint path. When virtual-terminal processing is available the
//! composer reuses the same SGR/cursor-addressing escape sequences as the
//! POSIX backend, written through `WriteConsoleW`; otherwise it falls back
//! to `SetConsoleTextAttribute` + `SetConsoleCursorPosition` with RGB
//! downgraded to the nearest of the 16 named colors.

use super::console::ConsoleHandles;
use super::VT_SUPPORTED;
use crate::BackendError;
use core_attr::{attribute_to_rgb, Attribute, Color, OutputMode, StyleFlags};
use core_cell::CellBuffer;
use std::sync::atomic::Ordering;
use windows_sys::Win32::System::Console::{
    SetConsoleCursorInfo, SetConsoleCursorPosition, SetConsoleTextAttribute, WriteConsoleW,
    BACKGROUND_BLUE, BACKGROUND_GREEN, BACKGROUND_INTENSITY, BACKGROUND_RED, CONSOLE_CURSOR_INFO,
    COORD, FOREGROUND_BLUE, FOREGROUND_GREEN, FOREGROUND_INTENSITY, FOREGROUND_RED,
};

pub struct Composer {
    mode: OutputMode,
}

impl Composer {
    pub fn new(mode: OutputMode) -> Self {
        Composer { mode }
    }

    pub fn set_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
    }

    pub fn compose(
        &mut self,
        handles: &ConsoleHandles,
        front: &CellBuffer,
        changed: &[(u16, u16)],
        cursor: Option<(u16, u16)>,
    ) -> Result<(), BackendError> {
        if VT_SUPPORTED.load(Ordering::Relaxed) {
            self.compose_vt(handles, front, changed, cursor)
        } else {
            self.compose_legacy(handles, front, changed, cursor)
        }
    }

    fn compose_vt(
        &mut self,
        handles: &ConsoleHandles,
        front: &CellBuffer,
        changed: &[(u16, u16)],
        cursor: Option<(u16, u16)>,
    ) -> Result<(), BackendError> {
        let mut seq = String::new();
        for &(x, y) in changed {
            let Some(cell) = front.get(x, y) else { continue };
            if cell.is_continuation() {
                continue;
            }
            seq.push_str(&format!("\x1b[{};{}H\x1b[0m", y + 1, x + 1));
            push_sgr(&mut seq, cell.fg, cell.bg, self.mode);
            let ch = char::from_u32(cell.rune).unwrap_or(' ');
            seq.push(ch);
        }
        match cursor {
            Some((x, y)) => {
                seq.push_str(&format!("\x1b[{};{}H\x1b[?25h", y + 1, x + 1));
            }
            None => seq.push_str("\x1b[?25l"),
        }
        write_console(handles, &seq)
    }

    fn compose_legacy(
        &mut self,
        handles: &ConsoleHandles,
        front: &CellBuffer,
        changed: &[(u16, u16)],
        cursor: Option<(u16, u16)>,
    ) -> Result<(), BackendError> {
        for &(x, y) in changed {
            let Some(cell) = front.get(x, y) else { continue };
            if cell.is_continuation() {
                continue;
            }
            unsafe {
                SetConsoleCursorPosition(handles.stdout_handle(), COORD { X: x as i16, Y: y as i16 });
                SetConsoleTextAttribute(handles.stdout_handle(), legacy_attr(cell.fg, cell.bg));
            }
            let ch = char::from_u32(cell.rune).unwrap_or(' ');
            write_console(handles, &ch.to_string())?;
        }
        unsafe {
            let (shown, pos) = match cursor {
                Some((x, y)) => (1, COORD { X: x as i16, Y: y as i16 }),
                None => (0, COORD { X: 0, Y: 0 }),
            };
            if shown == 1 {
                SetConsoleCursorPosition(handles.stdout_handle(), pos);
            }
            let info = CONSOLE_CURSOR_INFO {
                dwSize: 25,
                bVisible: shown,
            };
            SetConsoleCursorInfo(handles.stdout_handle(), &info);
        }
        Ok(())
    }
}

fn write_console(handles: &ConsoleHandles, text: &str) -> Result<(), BackendError> {
    let wide: Vec<u16> = text.encode_utf16().collect();
    let mut written = 0u32;
    unsafe {
        if WriteConsoleW(
            handles.stdout_handle(),
            wide.as_ptr() as *const _,
            wide.len() as u32,
            &mut written,
            std::ptr::null_mut(),
        ) == 0
        {
            return Err(BackendError::Io(std::io::Error::last_os_error()));
        }
    }
    Ok(())
}

fn push_sgr(seq: &mut String, fg: Attribute, bg: Attribute, mode: OutputMode) {
    let flags = fg.style_flags();
    if flags.contains(StyleFlags::BOLD) {
        seq.push_str("\x1b[1m");
    }
    if flags.contains(StyleFlags::UNDERLINE) {
        seq.push_str("\x1b[4m");
    }
    if flags.contains(StyleFlags::REVERSE) {
        seq.push_str("\x1b[7m");
    }
    push_color(seq, fg, true, mode);
    push_color(seq, bg, false, mode);
}

fn push_color(seq: &mut String, attr: Attribute, foreground: bool, mode: OutputMode) {
    match mode {
        OutputMode::Rgb => {
            if !attr.is_default_color() {
                let (r, g, b) = attribute_to_rgb(attr);
                let prefix = if foreground { 38 } else { 48 };
                seq.push_str(&format!("\x1b[{prefix};2;{r};{g};{b}m"));
            }
        }
        _ => {
            if let Color::Named(i) = attr.color() {
                let base = if foreground { 30 } else { 40 };
                let code = if i < 8 {
                    base + i as u16
                } else {
                    let bright_base = if foreground { 90 } else { 100 };
                    bright_base + (i - 8) as u16
                };
                seq.push_str(&format!("\x1b[{code}m"));
            }
        }
    }
}

/// Map a foreground/background attribute pair to a Win32 legacy
/// text-attribute word, approximating anything richer than the 16 named
/// colors via nearest RGB.
fn legacy_attr(fg: Attribute, bg: Attribute) -> u16 {
    foreground_bits(fg) | background_bits(bg)
}

fn foreground_bits(fg: Attribute) -> u16 {
    let (r, g, b) = attribute_to_rgb(fg);
    let mut bits = 0u16;
    if r > 127 {
        bits |= FOREGROUND_RED as u16;
    }
    if g > 127 {
        bits |= FOREGROUND_GREEN as u16;
    }
    if b > 127 {
        bits |= FOREGROUND_BLUE as u16;
    }
    if fg.style_flags().contains(StyleFlags::BOLD) || (r > 200 || g > 200 || b > 200) {
        bits |= FOREGROUND_INTENSITY as u16;
    }
    bits
}

fn background_bits(bg: Attribute) -> u16 {
    let (r, g, b) = attribute_to_rgb(bg);
    let mut bits = 0u16;
    if r > 127 {
        bits |= BACKGROUND_RED as u16;
    }
    if g > 127 {
        bits |= BACKGROUND_GREEN as u16;
    }
    if b > 127 {
        bits |= BACKGROUND_BLUE as u16;
    }
    if r > 200 || g > 200 || b > 200 {
        bits |= BACKGROUND_INTENSITY as u16;
    }
    bits
}
