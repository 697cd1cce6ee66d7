#![forbid(unsafe_code)]

//! Input event types.
//!
//! Three kinds of values flow through the input layer:
//!
//! - [`RawKeyNotification`]: what a key hook yields (code + direction), before
//!   any classification.
//! - [`KeyEvent`]: a classified notification living in the shared input
//!   buffer for exactly one frame.
//! - [`PlatformEvent`]: non-key input drained by the sampler each frame
//!   (focus, mouse motion, wheel, mouse buttons, resize).
//!
//! # Design Notes
//!
//! - Mouse buttons are tracked in 8 distinct slots: 6 physical buttons and
//!   2 synthesized wheel pulses. Physical button masks use bitflags.

use bitflags::bitflags;

use crate::key::KeyCode;
use crate::key_state::KeyState;

/// Direction of a raw key notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyDirection {
    /// Key went (or is repeating) down.
    Down,
    /// Key went up.
    Up,
}

/// Unclassified key notification from a key hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawKeyNotification {
    pub code: KeyCode,
    pub direction: KeyDirection,
}

impl RawKeyNotification {
    #[must_use]
    pub const fn down(code: KeyCode) -> Self {
        Self {
            code,
            direction: KeyDirection::Down,
        }
    }

    #[must_use]
    pub const fn up(code: KeyCode) -> Self {
        Self {
            code,
            direction: KeyDirection::Up,
        }
    }
}

/// A classified key event, valid for the frame it was consumed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub state: KeyState,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(code: KeyCode, state: KeyState) -> Self {
        Self { code, state }
    }

    /// First press (not an auto-repeat).
    #[inline]
    #[must_use]
    pub const fn is_press(&self) -> bool {
        self.state.pressed
    }

    /// Auto-repeat of a key already down.
    #[inline]
    #[must_use]
    pub const fn is_repeat(&self) -> bool {
        self.state.held && !self.state.pressed
    }

    #[inline]
    #[must_use]
    pub const fn is_release(&self) -> bool {
        self.state.released
    }
}

/// Mouse button slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    M1,
    M2,
    M3,
    /// Synthesized one-frame pulse for a forward wheel step.
    WheelForward,
    /// Synthesized one-frame pulse for a backward wheel step.
    WheelBackward,
}

impl MouseButton {
    /// Every slot, in index order.
    pub const ALL: [MouseButton; 8] = [
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::M1,
        MouseButton::M2,
        MouseButton::M3,
        MouseButton::WheelForward,
        MouseButton::WheelBackward,
    ];

    /// Slot index in the mouse transition table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this slot is a synthesized wheel pulse.
    #[inline]
    #[must_use]
    pub const fn is_wheel(self) -> bool {
        matches!(self, Self::WheelForward | Self::WheelBackward)
    }
}

bitflags! {
    /// Physical mouse buttons currently down. Bit `i` is button `i`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseButtons: u8 {
        const LEFT   = 1 << 0;
        const RIGHT  = 1 << 1;
        const MIDDLE = 1 << 2;
        const M1     = 1 << 3;
        const M2     = 1 << 4;
        const M3     = 1 << 5;
    }
}

impl MouseButtons {
    /// The flag for a physical button; empty for wheel slots.
    #[must_use]
    pub const fn of(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => Self::LEFT,
            MouseButton::Right => Self::RIGHT,
            MouseButton::Middle => Self::MIDDLE,
            MouseButton::M1 => Self::M1,
            MouseButton::M2 => Self::M2,
            MouseButton::M3 => Self::M3,
            MouseButton::WheelForward | MouseButton::WheelBackward => Self::empty(),
        }
    }
}

/// Non-key input drained once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformEvent {
    /// Surface gained (`true`) or lost (`false`) focus.
    Focus(bool),
    /// Mouse moved to grid coordinates.
    MouseMoved { x: i32, y: i32 },
    /// One wheel step.
    MouseWheel { forward: bool },
    /// Full physical button mask after a button change.
    MouseButtons { mask: MouseButtons },
    /// Surface resized, in terminal columns and rows.
    Resize { columns: u16, rows: u16 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Key;

    #[test]
    fn mouse_slots_are_distinct() {
        for (i, button) in MouseButton::ALL.iter().enumerate() {
            assert_eq!(button.index(), i);
        }
        assert_ne!(MouseButton::M3.index(), MouseButton::WheelForward.index());
    }

    #[test]
    fn wheel_slots_have_no_physical_flag() {
        assert!(MouseButtons::of(MouseButton::WheelForward).is_empty());
        assert!(MouseButtons::of(MouseButton::WheelBackward).is_empty());
        assert_eq!(MouseButtons::of(MouseButton::Middle), MouseButtons::MIDDLE);
    }

    #[test]
    fn physical_flags_match_slot_indices() {
        for button in MouseButton::ALL.iter().filter(|b| !b.is_wheel()) {
            assert_eq!(MouseButtons::of(*button).bits(), 1 << button.index());
        }
    }

    #[test]
    fn key_event_predicates() {
        let code = Key::Space.code();
        assert!(KeyEvent::new(code, KeyState::PRESSED).is_press());
        assert!(KeyEvent::new(code, KeyState::HELD).is_repeat());
        assert!(KeyEvent::new(code, KeyState::RELEASED).is_release());
        assert!(!KeyEvent::new(code, KeyState::PRESSED).is_repeat());
    }
}
