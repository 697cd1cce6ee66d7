#![forbid(unsafe_code)]

//! Per-frame input sampling.
//!
//! [`InputSampler::sample`] runs once per main-loop iteration, on the main
//! thread, in a fixed order:
//!
//! 1. Read the raw key-down table from the [`InputSource`] and diff it against
//!    the previous frame. Any code whose raw value changed becomes
//!    [`last_key`](InputSampler::last_key).
//! 2. Drain pending [`PlatformEvent`]s: focus, mouse position, wheel steps,
//!    mouse button masks, resizes.
//! 3. Diff the mouse button table with the same rule as keys.
//! 4. Reset the wheel slots so each wheel step is a one-frame pulse.
//!
//! The result depends only on the previous raw state, the current raw state,
//! and the events drained this frame.

use crate::event::{MouseButton, MouseButtons, PlatformEvent};
use crate::key::{KEY_COUNT, KeyCode};
use crate::key_state::{KeyState, KeyTransitionTable, MouseTransitionTable};

/// Upper bound on platform events drained in one sample.
///
/// Anything beyond stays queued for the next frame.
pub const MAX_PLATFORM_EVENTS_PER_SAMPLE: usize = 1024;

/// Polled input provider, implemented by backends.
pub trait InputSource {
    /// Write the current down/up value of every key code into `out`.
    fn sample_keys(&mut self, out: &mut [bool; KEY_COUNT]);

    /// Next queued platform event, or `None` when the queue is empty.
    fn poll_platform_event(&mut self) -> Option<PlatformEvent>;
}

impl<S: InputSource + ?Sized> InputSource for &mut S {
    fn sample_keys(&mut self, out: &mut [bool; KEY_COUNT]) {
        (**self).sample_keys(out);
    }

    fn poll_platform_event(&mut self) -> Option<PlatformEvent> {
        (**self).poll_platform_event()
    }
}

/// Mouse position in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MousePosition {
    pub x: i32,
    pub y: i32,
}

/// Main-thread sampler state.
#[derive(Debug, Clone)]
pub struct InputSampler {
    keys: KeyTransitionTable,
    mouse: MouseTransitionTable,
    raw_keys: [bool; KEY_COUNT],
    raw_mouse: [bool; 8],
    position: MousePosition,
    in_focus: bool,
    last_key: KeyCode,
    pending_resize: Option<(u16, u16)>,
    frame_events: Vec<PlatformEvent>,
}

impl Default for InputSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSampler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: KeyTransitionTable::new(),
            mouse: MouseTransitionTable::new(),
            raw_keys: [false; KEY_COUNT],
            raw_mouse: [false; 8],
            position: MousePosition::default(),
            in_focus: true,
            last_key: KeyCode::EMPTY,
            pending_resize: None,
            frame_events: Vec::new(),
        }
    }

    /// Run one sampling pass against `source`.
    pub fn sample<S: InputSource + ?Sized>(&mut self, source: &mut S) {
        self.raw_keys = [false; KEY_COUNT];
        source.sample_keys(&mut self.raw_keys);
        if let Some(changed) = self.keys.update(&self.raw_keys) {
            self.last_key = KeyCode(changed as u8);
        }

        self.frame_events.clear();
        while self.frame_events.len() < MAX_PLATFORM_EVENTS_PER_SAMPLE {
            let Some(event) = source.poll_platform_event() else {
                break;
            };
            self.apply(event);
            self.frame_events.push(event);
        }
        if self.frame_events.len() == MAX_PLATFORM_EVENTS_PER_SAMPLE {
            tracing::debug!(
                limit = MAX_PLATFORM_EVENTS_PER_SAMPLE,
                "platform event drain hit its per-frame limit"
            );
        }

        self.mouse.update(&self.raw_mouse);

        self.raw_mouse[MouseButton::WheelForward.index()] = false;
        self.raw_mouse[MouseButton::WheelBackward.index()] = false;
    }

    fn apply(&mut self, event: PlatformEvent) {
        match event {
            PlatformEvent::Focus(focused) => self.in_focus = focused,
            PlatformEvent::MouseMoved { x, y } => self.position = MousePosition { x, y },
            PlatformEvent::MouseWheel { forward } => {
                let slot = if forward {
                    MouseButton::WheelForward
                } else {
                    MouseButton::WheelBackward
                };
                self.raw_mouse[slot.index()] = true;
            }
            PlatformEvent::MouseButtons { mask } => {
                for button in MouseButton::ALL.into_iter().filter(|b| !b.is_wheel()) {
                    self.raw_mouse[button.index()] = mask.contains(MouseButtons::of(button));
                }
            }
            PlatformEvent::Resize { columns, rows } => {
                tracing::debug!(columns, rows, "resize observed");
                self.pending_resize = Some((columns, rows));
            }
        }
    }

    /// This frame's state for `code`.
    #[inline]
    #[must_use]
    pub fn key(&self, code: KeyCode) -> KeyState {
        self.keys.key(code)
    }

    /// This frame's state for `button`.
    #[inline]
    #[must_use]
    pub fn mouse_button(&self, button: MouseButton) -> KeyState {
        self.mouse.get(button.index())
    }

    #[inline]
    #[must_use]
    pub fn mouse_position(&self) -> MousePosition {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn in_focus(&self) -> bool {
        self.in_focus
    }

    /// Code whose raw state changed most recently, or [`KeyCode::EMPTY`].
    #[inline]
    #[must_use]
    pub fn last_key(&self) -> KeyCode {
        self.last_key
    }

    /// Platform events drained by the last sample, in order.
    #[must_use]
    pub fn frame_events(&self) -> &[PlatformEvent] {
        &self.frame_events
    }

    /// Take the most recent unhandled resize, if any.
    pub fn take_resize(&mut self) -> Option<(u16, u16)> {
        self.pending_resize.take()
    }

    /// Full keyboard transition table.
    #[must_use]
    pub fn keys(&self) -> &KeyTransitionTable {
        &self.keys
    }
}
