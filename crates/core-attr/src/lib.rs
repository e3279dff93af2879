//! Color and style attribute encoding.
//!
//! An [`Attribute`] is an opaque 64-bit token: the low 48 bits hold a color
//! payload, the next 8 bits tag which color space the payload belongs to,
//! and the top 8 bits hold independent style flags. The layout is stable
//! within a build but is not part of the public contract (construct and
//! inspect attributes only through the typed accessors below).

use bitflags::bitflags;

const STYLE_SHIFT: u32 = 56;
const KIND_SHIFT: u32 = 48;
const PAYLOAD_MASK: u64 = 0x0000_ffff_ffff_ffff;
const KIND_MASK: u64 = 0xff;
const STYLE_MASK: u64 = 0xff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
enum ColorKind {
    Default = 0,
    Named = 1,
    Indexed = 2,
    Cube216 = 3,
    Gray = 4,
    Rgb = 5,
}

impl ColorKind {
    fn from_u64(v: u64) -> Self {
        match v {
            1 => ColorKind::Named,
            2 => ColorKind::Indexed,
            3 => ColorKind::Cube216,
            4 => ColorKind::Gray,
            5 => ColorKind::Rgb,
            _ => ColorKind::Default,
        }
    }
}

/// A decomposed, typed view of an [`Attribute`]'s color component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// The terminal's default foreground/background.
    Default,
    /// One of the 16 named ANSI colors (0-15).
    Named(u8),
    /// One of the 256 palette indices.
    Indexed(u8),
    /// One of the 216 values in the 6x6x6 color cube (0-215).
    Cube216(u8),
    /// One of the 26-step grayscale ramp (0-25).
    Gray(u8),
    /// Full 24-bit RGB.
    Rgb(u8, u8, u8),
}

bitflags! {
    /// Independent style bits, OR-able onto any color.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StyleFlags: u8 {
        const BOLD       = 0b0000_0001;
        const UNDERLINE  = 0b0000_0010;
        const REVERSE    = 0b0000_0100;
        const BLINK      = 0b0000_1000;
        const DIM        = 0b0001_0000;
        const CURSIVE    = 0b0010_0000;
        const HIDDEN     = 0b0100_0000;
        const BRIGHTNESS = 0b1000_0000;
    }
}

/// The color space currently in effect for interpreting attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputMode {
    /// Query/keep the current mode unchanged.
    Current,
    /// 16-color ANSI.
    #[default]
    Normal,
    /// 256-color palette.
    Color256,
    /// 216-value color cube subset.
    Color216,
    /// 26-step grayscale ramp.
    Grayscale,
    /// Full 24-bit RGB.
    Rgb,
}

/// An opaque color+style token. Cheap to copy; `Default` is the terminal's
/// default foreground/background with no style bits set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attribute(u64);

impl Attribute {
    /// The terminal's default color, no style.
    pub const DEFAULT: Attribute = Attribute(0);

    fn from_parts(kind: ColorKind, payload: u64) -> Self {
        Attribute(((kind as u64) << KIND_SHIFT) | (payload & PAYLOAD_MASK))
    }

    /// One of the 16 named ANSI colors.
    pub fn named(index: u8) -> Self {
        debug_assert!(index < 16, "named color index out of range: {index}");
        Self::from_parts(ColorKind::Named, index as u64)
    }

    /// One of the 256 palette indices.
    pub fn indexed(index: u8) -> Self {
        Self::from_parts(ColorKind::Indexed, index as u64)
    }

    /// One of the 216 values in the color cube.
    pub fn cube216(index: u8) -> Self {
        debug_assert!(index < 216, "cube216 index out of range: {index}");
        Self::from_parts(ColorKind::Cube216, index as u64)
    }

    /// One of the 26-step grayscale ramp.
    pub fn gray(step: u8) -> Self {
        debug_assert!(step < 26, "grayscale step out of range: {step}");
        Self::from_parts(ColorKind::Gray, step as u64)
    }

    /// Full 24-bit RGB.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_parts(ColorKind::Rgb, pack_rgb(r, g, b))
    }

    /// Typed view of the color component, discarding style bits.
    pub fn color(self) -> Color {
        let kind = ColorKind::from_u64((self.0 >> KIND_SHIFT) & KIND_MASK);
        let payload = self.0 & PAYLOAD_MASK;
        match kind {
            ColorKind::Default => Color::Default,
            ColorKind::Named => Color::Named(payload as u8),
            ColorKind::Indexed => Color::Indexed(payload as u8),
            ColorKind::Cube216 => Color::Cube216(payload as u8),
            ColorKind::Gray => Color::Gray(payload as u8),
            ColorKind::Rgb => {
                let (r, g, b) = unpack_rgb(payload);
                Color::Rgb(r, g, b)
            }
        }
    }

    /// The style bits set on this attribute.
    pub fn style_flags(self) -> StyleFlags {
        StyleFlags::from_bits_truncate(((self.0 >> STYLE_SHIFT) & STYLE_MASK) as u8)
    }

    /// Returns a copy with `flags` OR-ed onto the existing style bits.
    /// OR is associative/commutative and preserves the color (including the
    /// `Default` sentinel) untouched.
    pub fn with_style(self, flags: StyleFlags) -> Self {
        let existing = self.style_flags();
        let merged = existing | flags;
        let color_bits = self.0 & (PAYLOAD_MASK | (KIND_MASK << KIND_SHIFT));
        Attribute(color_bits | ((merged.bits() as u64) << STYLE_SHIFT))
    }

    /// Returns whether this is the unstyled `Default` sentinel color.
    pub fn is_default_color(self) -> bool {
        matches!(self.color(), Color::Default)
    }
}

impl std::ops::BitOr<StyleFlags> for Attribute {
    type Output = Attribute;
    fn bitor(self, rhs: StyleFlags) -> Attribute {
        self.with_style(rhs)
    }
}

fn pack_rgb(r: u8, g: u8, b: u8) -> u64 {
    ((r as u64) << 16) | ((g as u64) << 8) | (b as u64)
}

fn unpack_rgb(payload: u64) -> (u8, u8, u8) {
    (
        ((payload >> 16) & 0xff) as u8,
        ((payload >> 8) & 0xff) as u8,
        (payload & 0xff) as u8,
    )
}

/// Encode a 24-bit color directly, bypassing [`Attribute::rgb`]'s
/// debug assertions (both exist so call sites can pick the idiom they
/// prefer; they are equivalent).
pub fn rgb_to_attribute(r: u8, g: u8, b: u8) -> Attribute {
    Attribute::rgb(r, g, b)
}

/// Inverse of [`rgb_to_attribute`]. Non-RGB colors are approximated via
/// the standard palette tables so backends can downgrade gracefully
/// (e.g. the Windows console mapping full RGB to the nearest of 16 colors).
pub fn attribute_to_rgb(a: Attribute) -> (u8, u8, u8) {
    match a.color() {
        Color::Default => (0, 0, 0),
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Named(i) => NAMED_RGB[(i as usize).min(15)],
        Color::Indexed(i) => indexed_to_rgb(i),
        Color::Cube216(i) => cube216_to_rgb(i),
        Color::Gray(i) => gray_to_rgb(i),
    }
}

/// The 16 named ANSI colors' canonical RGB values (xterm defaults).
pub const NAMED_RGB: [(u8, u8, u8); 16] = [
    (0, 0, 0),
    (205, 0, 0),
    (0, 205, 0),
    (205, 205, 0),
    (0, 0, 238),
    (205, 0, 205),
    (0, 205, 205),
    (229, 229, 229),
    (127, 127, 127),
    (255, 0, 0),
    (0, 255, 0),
    (255, 255, 0),
    (92, 92, 255),
    (255, 0, 255),
    (0, 255, 255),
    (255, 255, 255),
];

/// Map a 256-palette index to RGB: 0-15 named, 16-231 the 6x6x6 cube,
/// 232-255 the grayscale ramp.
pub fn indexed_to_rgb(i: u8) -> (u8, u8, u8) {
    match i {
        0..=15 => NAMED_RGB[i as usize],
        16..=231 => cube216_to_rgb(i - 16),
        _ => gray_to_rgb(i - 232),
    }
}

const CUBE_STEPS: [u8; 6] = [0, 95, 135, 175, 215, 255];

/// Map a 0-215 color-cube index to RGB.
pub fn cube216_to_rgb(i: u8) -> (u8, u8, u8) {
    let i = i as u32;
    let r = (i / 36) % 6;
    let g = (i / 6) % 6;
    let b = i % 6;
    (
        CUBE_STEPS[r as usize],
        CUBE_STEPS[g as usize],
        CUBE_STEPS[b as usize],
    )
}

/// Map a 0-25 grayscale step to RGB.
pub fn gray_to_rgb(step: u8) -> (u8, u8, u8) {
    let v = 8 + (step as u32) * 10;
    let v = v.min(255) as u8;
    (v, v, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_round_trips() {
        let a = rgb_to_attribute(150, 100, 50);
        assert_eq!(attribute_to_rgb(a), (150, 100, 50));
    }

    #[test]
    fn style_or_is_associative_and_preserves_default() {
        let a = Attribute::DEFAULT | StyleFlags::BOLD;
        assert!(a.is_default_color());
        assert!(a.style_flags().contains(StyleFlags::BOLD));

        let b = (Attribute::DEFAULT | StyleFlags::BOLD) | StyleFlags::UNDERLINE;
        let c = Attribute::DEFAULT | (StyleFlags::BOLD | StyleFlags::UNDERLINE);
        assert_eq!(b, c);
    }

    #[test]
    fn named_color_round_trips_kind() {
        let a = Attribute::named(1);
        assert_eq!(a.color(), Color::Named(1));
        assert_eq!(attribute_to_rgb(a), NAMED_RGB[1]);
    }

    #[test]
    fn cube216_covers_corners() {
        assert_eq!(cube216_to_rgb(0), (0, 0, 0));
        assert_eq!(cube216_to_rgb(215), (255, 255, 255));
    }

    #[test]
    fn indexed_dispatches_to_named_cube_or_gray() {
        assert_eq!(indexed_to_rgb(1), NAMED_RGB[1]);
        assert_eq!(indexed_to_rgb(16), cube216_to_rgb(0));
        assert_eq!(indexed_to_rgb(232), gray_to_rgb(0));
    }

    #[test]
    fn style_and_color_are_independent() {
        let a = Attribute::rgb(10, 20, 30) | StyleFlags::REVERSE;
        assert_eq!(a.color(), Color::Rgb(10, 20, 30));
        assert_eq!(a.style_flags(), StyleFlags::REVERSE);
    }
}
