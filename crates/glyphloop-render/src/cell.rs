#![forbid(unsafe_code)]

//! Cells and the 16-color console palette.
//!
//! An [`Attr`] packs a foreground [`Color`] in its low nibble and a
//! background [`Color`] in its high nibble, so `Attr::new(fg, bg)` and the
//! classic `FG_x | BG_y` byte are the same value.

/// One of the 16 console colors, numbered as the console numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Color {
    #[default]
    Black = 0x0,
    DarkBlue = 0x1,
    DarkGreen = 0x2,
    DarkCyan = 0x3,
    DarkRed = 0x4,
    DarkMagenta = 0x5,
    DarkYellow = 0x6,
    Gray = 0x7,
    DarkGray = 0x8,
    Blue = 0x9,
    Green = 0xA,
    Cyan = 0xB,
    Red = 0xC,
    Magenta = 0xD,
    Yellow = 0xE,
    White = 0xF,
}

impl Color {
    /// All colors in index order.
    pub const ALL: [Color; 16] = [
        Color::Black,
        Color::DarkBlue,
        Color::DarkGreen,
        Color::DarkCyan,
        Color::DarkRed,
        Color::DarkMagenta,
        Color::DarkYellow,
        Color::Gray,
        Color::DarkGray,
        Color::Blue,
        Color::Green,
        Color::Cyan,
        Color::Red,
        Color::Magenta,
        Color::Yellow,
        Color::White,
    ];

    /// Color for the low four bits of `index`.
    #[inline]
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        Self::ALL[(index & 0x0F) as usize]
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Whether this is one of the eight bright colors.
    #[inline]
    #[must_use]
    pub const fn is_bright(self) -> bool {
        self as u8 & 0x8 != 0
    }
}

/// Packed foreground/background attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Attr(pub u8);

impl Attr {
    /// Black on black.
    pub const BLACK: Self = Self(0x00);
    /// White on black.
    pub const WHITE: Self = Self(0x0F);

    #[inline]
    #[must_use]
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self(fg as u8 | ((bg as u8) << 4))
    }

    /// Foreground on black.
    #[inline]
    #[must_use]
    pub const fn fg_only(fg: Color) -> Self {
        Self::new(fg, Color::Black)
    }

    #[inline]
    #[must_use]
    pub const fn fg(self) -> Color {
        Color::from_index(self.0)
    }

    #[inline]
    #[must_use]
    pub const fn bg(self) -> Color {
        Color::from_index(self.0 >> 4)
    }

    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: Color) -> Self {
        Self::new(fg, self.bg())
    }

    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: Color) -> Self {
        Self::new(self.fg(), bg)
    }
}

impl From<Color> for Attr {
    fn from(fg: Color) -> Self {
        Self::fg_only(fg)
    }
}

/// A glyph with its color attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub glyph: char,
    pub attr: Attr,
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Cell {
    /// Blank cell: space on black.
    pub const EMPTY: Self = Self {
        glyph: ' ',
        attr: Attr::BLACK,
    };

    #[inline]
    #[must_use]
    pub const fn new(glyph: char, attr: Attr) -> Self {
        Self { glyph, attr }
    }

    /// Full block in `attr`.
    #[inline]
    #[must_use]
    pub const fn solid(attr: Attr) -> Self {
        Self::new(crate::glyph::SOLID, attr)
    }
}
