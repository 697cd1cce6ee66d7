#![forbid(unsafe_code)]

//! Per-frame Pressed/Held/Released transitions.
//!
//! A [`TransitionTable`] remembers the raw "down" value of every slot from
//! the previous sample and turns each new raw sample into a [`KeyState`]
//! per slot. The same rule drives the 256-entry keyboard table and the
//! 8-entry mouse-button table.
//!
//! # Transition rule
//!
//! | previous | current | pressed | held | released |
//! |----------|---------|---------|------|----------|
//! | up       | up      | false   | false | false   |
//! | up       | down    | **true**| true  | false   |
//! | down     | down    | false   | true  | false   |
//! | down     | up      | false   | false | **true**|
//!
//! `pressed` and `released` are never both true, and `pressed` only fires on
//! the frame where the slot goes from not-held to held.

use crate::key::{KEY_COUNT, KeyCode};

/// Transition state of one key or mouse button for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyState {
    /// Went down this frame.
    pub pressed: bool,
    /// Went up this frame.
    pub released: bool,
    /// Currently down.
    pub held: bool,
}

impl KeyState {
    /// Idle: not down, no transition.
    pub const IDLE: Self = Self {
        pressed: false,
        released: false,
        held: false,
    };

    /// First frame of a press.
    pub const PRESSED: Self = Self {
        pressed: true,
        released: false,
        held: true,
    };

    /// Down, but not newly so.
    pub const HELD: Self = Self {
        pressed: false,
        released: false,
        held: true,
    };

    /// Frame of a release.
    pub const RELEASED: Self = Self {
        pressed: false,
        released: true,
        held: false,
    };

    /// Apply the transition rule to one slot.
    #[inline]
    #[must_use]
    pub const fn transition(previously_held: bool, down: bool) -> Self {
        Self {
            pressed: down && !previously_held,
            released: !down && previously_held,
            held: down,
        }
    }

    /// Whether anything is happening on this slot (down or just released).
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.held || self.released
    }
}

/// Fixed-size transition table over `N` slots.
#[derive(Debug, Clone)]
pub struct TransitionTable<const N: usize> {
    states: [KeyState; N],
    previous: [bool; N],
}

/// Keyboard table, indexed by [`KeyCode`].
pub type KeyTransitionTable = TransitionTable<KEY_COUNT>;

/// Mouse-button table, indexed by [`MouseButton::index`](crate::event::MouseButton::index).
pub type MouseTransitionTable = TransitionTable<8>;

impl<const N: usize> Default for TransitionTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TransitionTable<N> {
    /// All slots idle.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            states: [KeyState::IDLE; N],
            previous: [false; N],
        }
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// Always false for a non-empty table.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Diff `raw` against the previous sample.
    ///
    /// Returns the highest slot whose raw value changed, if any.
    pub fn update(&mut self, raw: &[bool; N]) -> Option<usize> {
        let mut last_changed = None;
        for (i, (&down, prev)) in raw.iter().zip(self.previous.iter_mut()).enumerate() {
            self.states[i] = KeyState::transition(*prev, down);
            if down != *prev {
                last_changed = Some(i);
            }
            *prev = down;
        }
        last_changed
    }

    /// State of slot `index`; idle for out-of-range indices.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> KeyState {
        self.states.get(index).copied().unwrap_or(KeyState::IDLE)
    }

    /// All slot states.
    #[inline]
    #[must_use]
    pub fn states(&self) -> &[KeyState; N] {
        &self.states
    }

    /// Raw value recorded by the last [`update`](Self::update).
    #[inline]
    #[must_use]
    pub fn raw(&self, index: usize) -> bool {
        self.previous.get(index).copied().unwrap_or(false)
    }

    /// Forget everything, as if every slot had always been up.
    pub fn reset(&mut self) {
        self.states = [KeyState::IDLE; N];
        self.previous = [false; N];
    }
}

impl KeyTransitionTable {
    /// State of `code`.
    #[inline]
    #[must_use]
    pub fn key(&self, code: KeyCode) -> KeyState {
        self.states[code.index()]
    }
}
