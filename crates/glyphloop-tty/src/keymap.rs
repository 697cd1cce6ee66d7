#![forbid(unsafe_code)]

//! Crossterm key events to glyphloop key codes.
//!
//! Terminals report characters, not physical keys, so shifted symbols are
//! folded back onto the key that produces them on a US layout (`!` is
//! `Num1`, `{` is `LeftBracket`). Keypad keys are recognized only when the
//! terminal sets the keypad flag.

use crossterm::event::{KeyCode as CtKeyCode, KeyEventState, KeyModifiers, ModifierKeyCode};
use glyphloop_core::{Key, KeyCode};

/// Map a crossterm key to a glyphloop key code.
#[must_use]
pub fn map_key(code: CtKeyCode, state: KeyEventState) -> Option<KeyCode> {
    let keypad = state.contains(KeyEventState::KEYPAD);
    let key = match code {
        CtKeyCode::Backspace => Key::Backspace,
        CtKeyCode::Tab | CtKeyCode::BackTab => Key::Tab,
        CtKeyCode::Enter => Key::Enter,
        CtKeyCode::Esc => Key::Escape,
        CtKeyCode::Left => Key::Left,
        CtKeyCode::Right => Key::Right,
        CtKeyCode::Up => Key::Up,
        CtKeyCode::Down => Key::Down,
        CtKeyCode::Home => Key::Home,
        CtKeyCode::End => Key::End,
        CtKeyCode::PageUp => Key::PageUp,
        CtKeyCode::PageDown => Key::PageDown,
        CtKeyCode::Insert => Key::Insert,
        CtKeyCode::Delete => Key::Delete,
        CtKeyCode::Pause => Key::Pause,
        CtKeyCode::CapsLock => Key::CapsLock,
        CtKeyCode::F(n) => return Key::function(n).map(Key::code),
        CtKeyCode::Char(c) if keypad => return map_keypad_char(c).or_else(|| map_char(c)),
        CtKeyCode::Char(c) => return map_char(c),
        CtKeyCode::Modifier(m) => map_modifier(m)?,
        _ => return None,
    };
    Some(key.code())
}

fn map_keypad_char(c: char) -> Option<KeyCode> {
    let key = match c {
        '0'..='9' => {
            let offset = c as u8 - b'0';
            return Some(KeyCode(Key::Numpad0 as u8 + offset));
        }
        '*' => Key::NumpadMultiply,
        '+' => Key::NumpadAdd,
        '-' => Key::NumpadSubtract,
        '.' => Key::NumpadDecimal,
        '/' => Key::NumpadDivide,
        _ => return None,
    };
    Some(key.code())
}

/// Map a printable character to the key that types it.
#[must_use]
pub fn map_char(c: char) -> Option<KeyCode> {
    if let Some(key) = Key::letter(c).or_else(|| Key::digit(c)) {
        return Some(key.code());
    }
    let key = match c {
        ' ' => Key::Space,
        '!' => Key::Num1,
        '@' => Key::Num2,
        '#' => Key::Num3,
        '$' => Key::Num4,
        '%' => Key::Num5,
        '^' => Key::Num6,
        '&' => Key::Num7,
        '*' => Key::Num8,
        '(' => Key::Num9,
        ')' => Key::Num0,
        ';' | ':' => Key::Semicolon,
        '=' | '+' => Key::Equals,
        ',' | '<' => Key::Comma,
        '-' | '_' => Key::Minus,
        '.' | '>' => Key::Period,
        '/' | '?' => Key::Slash,
        '`' | '~' => Key::Backquote,
        '[' | '{' => Key::LeftBracket,
        '\\' | '|' => Key::Backslash,
        ']' | '}' => Key::RightBracket,
        '\'' | '"' => Key::Quote,
        '\t' => Key::Tab,
        _ => return None,
    };
    Some(key.code())
}

fn map_modifier(m: ModifierKeyCode) -> Option<Key> {
    Some(match m {
        ModifierKeyCode::LeftShift => Key::LeftShift,
        ModifierKeyCode::RightShift => Key::RightShift,
        ModifierKeyCode::LeftControl => Key::LeftCtrl,
        ModifierKeyCode::RightControl => Key::RightCtrl,
        ModifierKeyCode::LeftAlt => Key::LeftAlt,
        ModifierKeyCode::RightAlt => Key::RightAlt,
        _ => return None,
    })
}

/// Side-agnostic alias of a side-specific modifier code (`LeftShift` to
/// `Shift`).
#[must_use]
pub fn generic_modifier(code: KeyCode) -> Option<KeyCode> {
    let key = match code.named()? {
        Key::LeftShift | Key::RightShift => Key::Shift,
        Key::LeftCtrl | Key::RightCtrl => Key::Ctrl,
        Key::LeftAlt | Key::RightAlt => Key::Alt,
        _ => return None,
    };
    Some(key.code())
}

/// Generic modifier codes implied by a modifier mask.
pub fn modifier_codes(modifiers: KeyModifiers) -> impl Iterator<Item = KeyCode> {
    [
        (KeyModifiers::SHIFT, Key::Shift),
        (KeyModifiers::CONTROL, Key::Ctrl),
        (KeyModifiers::ALT, Key::Alt),
    ]
    .into_iter()
    .filter(move |(flag, _)| modifiers.contains(*flag))
    .map(|(_, key)| key.code())
}
