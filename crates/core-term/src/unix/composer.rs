//! Diff-driven ANSI/SGR byte emission: turns changed cell coordinates into
//! cursor-addressed escape sequences, minimizing redundant SGR resets by
//! tracking the last-emitted attribute pair.

use core_attr::{Attribute, Color, OutputMode, StyleFlags};
use core_cell::CellBuffer;
use std::io::Write;

/// Tracks the last attribute pair written so consecutive same-styled cells
/// don't re-emit an SGR sequence per cell.
pub struct Composer {
    mode: OutputMode,
    last: Option<(Attribute, Attribute)>,
}

impl Composer {
    pub fn new(mode: OutputMode) -> Self {
        Composer { mode, last: None }
    }

    pub fn set_mode(&mut self, mode: OutputMode) {
        self.mode = mode;
        self.last = None;
    }

    /// Writes the escape bytes to paint `changed` cells of `front`, then
    /// positions the cursor. Coordinates are 0-based; terminal addressing
    /// is 1-based.
    pub fn compose<W: Write>(
        &mut self,
        out: &mut W,
        front: &CellBuffer,
        changed: &[(u16, u16)],
        cursor: Option<(u16, u16)>,
    ) -> std::io::Result<()> {
        for &(x, y) in changed {
            let Some(cell) = front.get(x, y) else {
                continue;
            };
            if cell.is_continuation() {
                continue;
            }
            write!(out, "\x1b[{};{}H", y + 1, x + 1)?;
            self.write_sgr(out, cell.fg, cell.bg)?;
            let ch = char::from_u32(cell.rune).unwrap_or(' ');
            write!(out, "{ch}")?;
        }
        match cursor {
            Some((x, y)) => {
                write!(out, "\x1b[{};{}H\x1b[?25h", y + 1, x + 1)?;
            }
            None => {
                write!(out, "\x1b[?25l")?;
            }
        }
        out.flush()
    }

    fn write_sgr<W: Write>(&mut self, out: &mut W, fg: Attribute, bg: Attribute) -> std::io::Result<()> {
        if self.last == Some((fg, bg)) {
            return Ok(());
        }
        self.last = Some((fg, bg));
        write!(out, "\x1b[0m")?;
        let flags = fg.style_flags();
        if flags.contains(StyleFlags::BOLD) {
            write!(out, "\x1b[1m")?;
        }
        if flags.contains(StyleFlags::DIM) {
            write!(out, "\x1b[2m")?;
        }
        if flags.contains(StyleFlags::CURSIVE) {
            write!(out, "\x1b[3m")?;
        }
        if flags.contains(StyleFlags::UNDERLINE) {
            write!(out, "\x1b[4m")?;
        }
        if flags.contains(StyleFlags::BLINK) {
            write!(out, "\x1b[5m")?;
        }
        if flags.contains(StyleFlags::REVERSE) {
            write!(out, "\x1b[7m")?;
        }
        if flags.contains(StyleFlags::HIDDEN) {
            write!(out, "\x1b[8m")?;
        }
        self.write_color(out, fg, true)?;
        self.write_color(out, bg, false)
    }

    fn write_color<W: Write>(&self, out: &mut W, attr: Attribute, foreground: bool) -> std::io::Result<()> {
        let base = if foreground { 30 } else { 40 };
        match self.mode {
            OutputMode::Rgb => {
                let (r, g, b) = core_attr::attribute_to_rgb(attr);
                let prefix = if foreground { 38 } else { 48 };
                if !attr.is_default_color() {
                    write!(out, "\x1b[{prefix};2;{r};{g};{b}m")?;
                }
            }
            OutputMode::Color256 | OutputMode::Color216 | OutputMode::Grayscale => {
                let idx = match attr.color() {
                    Color::Default => return Ok(()),
                    Color::Named(i) => i,
                    Color::Indexed(i) => i,
                    Color::Cube216(i) => 16 + i,
                    Color::Gray(i) => 232 + i,
                    Color::Rgb(r, g, b) => nearest_256(r, g, b),
                };
                let prefix = if foreground { 38 } else { 48 };
                write!(out, "\x1b[{prefix};5;{idx}m")?;
            }
            OutputMode::Normal | OutputMode::Current => {
                if let Color::Named(i) = attr.color() {
                    let code = if i < 8 {
                        base + i as u16
                    } else {
                        let bright_base = if foreground { 90 } else { 100 };
                        bright_base + (i - 8) as u16
                    };
                    write!(out, "\x1b[{code}m")?;
                }
            }
        }
        Ok(())
    }
}

fn nearest_256(r: u8, g: u8, b: u8) -> u8 {
    let to_cube = |v: u8| -> u8 {
        let steps = [0u16, 95, 135, 175, 215, 255];
        steps
            .iter()
            .enumerate()
            .min_by_key(|(_, &s)| (s as i32 - v as i32).abs())
            .map(|(i, _)| i as u8)
            .unwrap_or(0)
    };
    16 + 36 * to_cube(r) + 6 * to_cube(g) + to_cube(b)
}
