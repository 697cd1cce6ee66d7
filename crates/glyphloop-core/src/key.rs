#![forbid(unsafe_code)]

//! Key identity: raw integer codes and the named keys they map to.
//!
//! A [`KeyCode`] is the integer identity every table in the engine is
//! indexed by. A [`Key`] is the human-facing name for the subset of codes
//! that have one. The two never alias: a `KeyCode` is converted to a `Key`
//! only through the lookup table, so an arbitrary numeric code can never be
//! mistaken for an enumerant with the same bit pattern.
//!
//! # Numbering
//!
//! Codes follow the classic virtual-key numbering used by console engines:
//!
//! | Range | Keys |
//! |-------|------|
//! | `0x30..=0x39` | digit row `0`-`9` |
//! | `0x41..=0x5A` | letters `A`-`Z` |
//! | `0x60..=0x6F` | numeric keypad |
//! | `0x70..=0x7B` | `F1`-`F12` |
//! | `0xA0..=0xA5` | left/right Shift, Ctrl, Alt |
//! | `0xBA..=0xDE` | punctuation |

use std::fmt;

/// Number of representable key codes (size of every key table).
pub const KEY_COUNT: usize = 256;

/// Integer key identifier in `0..KEY_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct KeyCode(pub u8);

impl KeyCode {
    /// Placeholder code reported before any key has changed state.
    pub const EMPTY: Self = Self(0x40);

    /// Create a key code from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw integer value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Index into a [`KEY_COUNT`]-sized table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Look up the named key for this code, if it has one.
    #[inline]
    #[must_use]
    pub const fn named(self) -> Option<Key> {
        NAMED_TABLE[self.0 as usize]
    }
}

impl From<Key> for KeyCode {
    fn from(key: Key) -> Self {
        key.code()
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.named() {
            Some(key) => write!(f, "{key:?}"),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

/// Named keys.
///
/// The discriminant of every variant is its [`KeyCode`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Key {
    Backspace = 0x08,
    Tab = 0x09,
    Enter = 0x0D,
    Shift = 0x10,
    Ctrl = 0x11,
    Alt = 0x12,
    Pause = 0x13,
    CapsLock = 0x14,
    Escape = 0x1B,
    Space = 0x20,
    PageUp = 0x21,
    PageDown = 0x22,
    End = 0x23,
    Home = 0x24,
    Left = 0x25,
    Up = 0x26,
    Right = 0x27,
    Down = 0x28,
    Insert = 0x2D,
    Delete = 0x2E,
    Num0 = 0x30,
    Num1 = 0x31,
    Num2 = 0x32,
    Num3 = 0x33,
    Num4 = 0x34,
    Num5 = 0x35,
    Num6 = 0x36,
    Num7 = 0x37,
    Num8 = 0x38,
    Num9 = 0x39,
    A = 0x41,
    B = 0x42,
    C = 0x43,
    D = 0x44,
    E = 0x45,
    F = 0x46,
    G = 0x47,
    H = 0x48,
    I = 0x49,
    J = 0x4A,
    K = 0x4B,
    L = 0x4C,
    M = 0x4D,
    N = 0x4E,
    O = 0x4F,
    P = 0x50,
    Q = 0x51,
    R = 0x52,
    S = 0x53,
    T = 0x54,
    U = 0x55,
    V = 0x56,
    W = 0x57,
    X = 0x58,
    Y = 0x59,
    Z = 0x5A,
    Numpad0 = 0x60,
    Numpad1 = 0x61,
    Numpad2 = 0x62,
    Numpad3 = 0x63,
    Numpad4 = 0x64,
    Numpad5 = 0x65,
    Numpad6 = 0x66,
    Numpad7 = 0x67,
    Numpad8 = 0x68,
    Numpad9 = 0x69,
    NumpadMultiply = 0x6A,
    NumpadAdd = 0x6B,
    NumpadSeparator = 0x6C,
    NumpadSubtract = 0x6D,
    NumpadDecimal = 0x6E,
    NumpadDivide = 0x6F,
    F1 = 0x70,
    F2 = 0x71,
    F3 = 0x72,
    F4 = 0x73,
    F5 = 0x74,
    F6 = 0x75,
    F7 = 0x76,
    F8 = 0x77,
    F9 = 0x78,
    F10 = 0x79,
    F11 = 0x7A,
    F12 = 0x7B,
    LeftShift = 0xA0,
    RightShift = 0xA1,
    LeftCtrl = 0xA2,
    RightCtrl = 0xA3,
    LeftAlt = 0xA4,
    RightAlt = 0xA5,
    Semicolon = 0xBA,
    Equals = 0xBB,
    Comma = 0xBC,
    Minus = 0xBD,
    Period = 0xBE,
    Slash = 0xBF,
    Backquote = 0xC0,
    LeftBracket = 0xDB,
    Backslash = 0xDC,
    RightBracket = 0xDD,
    Quote = 0xDE,
}

impl Key {
    /// Every named key, in code order.
    pub const ALL: [Key; 101] = [
        Key::Backspace,
        Key::Tab,
        Key::Enter,
        Key::Shift,
        Key::Ctrl,
        Key::Alt,
        Key::Pause,
        Key::CapsLock,
        Key::Escape,
        Key::Space,
        Key::PageUp,
        Key::PageDown,
        Key::End,
        Key::Home,
        Key::Left,
        Key::Up,
        Key::Right,
        Key::Down,
        Key::Insert,
        Key::Delete,
        Key::Num0,
        Key::Num1,
        Key::Num2,
        Key::Num3,
        Key::Num4,
        Key::Num5,
        Key::Num6,
        Key::Num7,
        Key::Num8,
        Key::Num9,
        Key::A,
        Key::B,
        Key::C,
        Key::D,
        Key::E,
        Key::F,
        Key::G,
        Key::H,
        Key::I,
        Key::J,
        Key::K,
        Key::L,
        Key::M,
        Key::N,
        Key::O,
        Key::P,
        Key::Q,
        Key::R,
        Key::S,
        Key::T,
        Key::U,
        Key::V,
        Key::W,
        Key::X,
        Key::Y,
        Key::Z,
        Key::Numpad0,
        Key::Numpad1,
        Key::Numpad2,
        Key::Numpad3,
        Key::Numpad4,
        Key::Numpad5,
        Key::Numpad6,
        Key::Numpad7,
        Key::Numpad8,
        Key::Numpad9,
        Key::NumpadMultiply,
        Key::NumpadAdd,
        Key::NumpadSeparator,
        Key::NumpadSubtract,
        Key::NumpadDecimal,
        Key::NumpadDivide,
        Key::F1,
        Key::F2,
        Key::F3,
        Key::F4,
        Key::F5,
        Key::F6,
        Key::F7,
        Key::F8,
        Key::F9,
        Key::F10,
        Key::F11,
        Key::F12,
        Key::LeftShift,
        Key::RightShift,
        Key::LeftCtrl,
        Key::RightCtrl,
        Key::LeftAlt,
        Key::RightAlt,
        Key::Semicolon,
        Key::Equals,
        Key::Comma,
        Key::Minus,
        Key::Period,
        Key::Slash,
        Key::Backquote,
        Key::LeftBracket,
        Key::Backslash,
        Key::RightBracket,
        Key::Quote,
    ];

    /// The integer code of this key.
    #[inline]
    #[must_use]
    pub const fn code(self) -> KeyCode {
        KeyCode(self as u8)
    }

    /// Letter key for an ASCII letter (either case).
    #[must_use]
    pub const fn letter(c: char) -> Option<Self> {
        if c.is_ascii_alphabetic() {
            KeyCode(c.to_ascii_uppercase() as u8).named()
        } else {
            None
        }
    }

    /// Digit-row key for an ASCII digit.
    #[must_use]
    pub const fn digit(c: char) -> Option<Self> {
        if c.is_ascii_digit() {
            KeyCode(c as u8).named()
        } else {
            None
        }
    }

    /// Function key `F1`..=`F12`.
    #[must_use]
    pub const fn function(n: u8) -> Option<Self> {
        if n >= 1 && n <= 12 {
            KeyCode(Key::F1 as u8 + n - 1).named()
        } else {
            None
        }
    }
}

const NAMED_TABLE: [Option<Key>; KEY_COUNT] = build_named_table();

const fn build_named_table() -> [Option<Key>; KEY_COUNT] {
    let mut table = [None; KEY_COUNT];
    let mut i = 0;
    while i < Key::ALL.len() {
        let key = Key::ALL[i];
        table[key as u8 as usize] = Some(key);
        i += 1;
    }
    table
}
