#![forbid(unsafe_code)]

//! glyphloop public facade crate.
//!
//! Re-exports the types a game needs from the internal crates and offers a
//! prelude for day-to-day usage.
//!
//! ```ignore
//! use glyphloop::prelude::*;
//!
//! struct Hello;
//!
//! impl Game for Hello {
//!     fn init(&mut self, _ctx: &mut Context<'_>) {}
//!
//!     fn update(&mut self, ctx: &mut Context<'_>, _dt: f64) -> Flow {
//!         ctx.grid_mut().draw_text(1, 1, "hello", Attr::WHITE);
//!         if ctx.key_named(Key::Escape).pressed {
//!             Flow::Exit
//!         } else {
//!             Flow::Continue
//!         }
//!     }
//! }
//!
//! fn main() -> glyphloop::Result<()> {
//!     let config = EngineConfig::default().title("hello").windowed(40, 10);
//!     Engine::new(TtyBackend::new(), config).run(&mut Hello)
//! }
//! ```

// --- Input re-exports ------------------------------------------------------

pub use glyphloop_core::{
    CaptureHandle, EventCapture, InputBuffer, Key, KeyCode, KeyDirection, KeyEvent, KeyHook,
    KeyState, MouseButton, MouseButtons, MousePosition, PlatformEvent, RawKeyNotification,
};

// --- Render re-exports -----------------------------------------------------

pub use glyphloop_render::{Attr, BoxChars, Cell, Color, Draw, Grid, glyph, grayscale};

// --- Backend re-exports ----------------------------------------------------

pub use glyphloop_backend::{Backend, CellScale, SurfaceRequest};

// --- Runtime re-exports ----------------------------------------------------

pub use glyphloop_runtime::{
    ConfigError, Context, Engine, EngineConfig, EngineError, EngineState, Flow, FrameRate, Game,
    HeadlessBackend, HeadlessController, Result, RoutineToken, ScreenMode, SetupError,
    ShutdownHandle, TerminationWatcher, Timer,
};

#[cfg(feature = "tty")]
pub use glyphloop_tty::{SessionOptions, TtyBackend};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Attr, Cell, Color, Context, Draw, Engine, EngineConfig, Flow, FrameRate, Game, Grid, Key,
        KeyCode, KeyState, MouseButton, ScreenMode, ShutdownHandle, Timer,
    };

    #[cfg(feature = "tty")]
    pub use crate::TtyBackend;

    pub use crate::{backend, core, render, runtime};
}

pub use glyphloop_backend as backend;
pub use glyphloop_core as core;
pub use glyphloop_render as render;
pub use glyphloop_runtime as runtime;
#[cfg(feature = "tty")]
pub use glyphloop_tty as tty;
