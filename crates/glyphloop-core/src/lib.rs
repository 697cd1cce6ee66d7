#![forbid(unsafe_code)]

//! Core: key codes, key transitions, event capture, and input sampling.
//!
//! # Role in glyphloop
//! `glyphloop-core` is the input layer. It owns the two input paths the
//! engine merges every frame:
//!
//! - **Event capture**: a dedicated thread blocks on a [`KeyHook`] and appends
//!   classified [`KeyEvent`]s to the shared [`InputBuffer`].
//! - **Input sampling**: the main loop polls the raw key table and drains
//!   platform events through an [`InputSource`], producing this frame's
//!   Pressed/Held/Released transitions.
//!
//! # How it fits in the system
//! The runtime (`glyphloop-runtime`) owns one [`InputBuffer`] and one
//! [`InputSampler`] per engine and hands read-only views of both to the
//! game's `update` callback. Backends (`glyphloop-tty`) implement
//! [`KeyHook`] and [`InputSource`] for a concrete platform.
//!
//! [`KeyHook`]: capture::KeyHook
//! [`KeyEvent`]: event::KeyEvent
//! [`InputBuffer`]: capture::InputBuffer
//! [`InputSource`]: sampler::InputSource
//! [`InputSampler`]: sampler::InputSampler

pub mod capture;
pub mod event;
pub mod key;
pub mod key_state;
pub mod sampler;

pub use capture::{
    CaptureHandle, CaptureStop, ChannelKeyHook, ChannelKeySender, EventCapture, InputBuffer,
    InputBufferGuard, KeyHook,
};
pub use event::{KeyDirection, KeyEvent, MouseButton, MouseButtons, PlatformEvent, RawKeyNotification};
pub use key::{KEY_COUNT, Key, KeyCode};
pub use key_state::{KeyState, KeyTransitionTable, MouseTransitionTable, TransitionTable};
pub use sampler::{InputSampler, InputSource, MousePosition};
