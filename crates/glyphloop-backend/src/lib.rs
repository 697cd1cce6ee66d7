#![forbid(unsafe_code)]
#![doc = "Backend traits for glyphloop: platform abstraction for time, surface, input, and presentation."]
#![doc = ""]
#![doc = "This crate defines the boundary between the glyphloop runtime and a concrete"]
#![doc = "platform (the native terminal via `glyphloop-tty`, or the in-memory headless"]
#![doc = "backend the runtime ships for tests)."]

use core::fmt;
use core::time::Duration;

use glyphloop_core::{InputSource, KeyHook};
use glyphloop_render::Grid;

/// Monotonic time source for frame pacing.
///
/// The runtime never calls `Instant::now()` or `thread::sleep` directly; all
/// time flows through this trait so pacing can run against a manual clock.
pub trait BackendClock {
    /// Elapsed time since an unspecified epoch, monotonically increasing.
    fn now_mono(&self) -> Duration;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// How many terminal cells one grid cell occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellScale {
    pub width: u16,
    pub height: u16,
}

impl Default for CellScale {
    fn default() -> Self {
        Self::UNIT
    }
}

impl CellScale {
    pub const UNIT: Self = Self {
        width: 1,
        height: 1,
    };

    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// What the runtime asks of the surface when a run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceRequest {
    /// Initial window title.
    pub title: String,
    pub scale: CellScale,
    /// Report mouse motion, buttons, and wheel.
    pub capture_mouse: bool,
    /// For platforms that never report key releases: how long after the last
    /// down notification a key counts as released.
    pub key_release_timeout: Duration,
}

impl Default for SurfaceRequest {
    fn default() -> Self {
        Self {
            title: String::new(),
            scale: CellScale::UNIT,
            capture_mouse: true,
            key_release_timeout: Duration::from_millis(700),
        }
    }
}

/// Display surface lifecycle: size negotiation, setup, restore.
pub trait BackendSurface {
    /// Platform-specific error type.
    type Error: fmt::Debug + fmt::Display;

    /// Current surface extent in terminal columns and rows.
    fn terminal_size(&self) -> Result<(u16, u16), Self::Error>;

    /// Take over the surface (raw mode, alternate screen, input reporting).
    fn open(&mut self, request: &SurfaceRequest) -> Result<(), Self::Error>;

    /// Restore the surface to its state before [`open`](Self::open).
    ///
    /// Must be safe to call when not open.
    fn close(&mut self) -> Result<(), Self::Error>;
}

/// Presentation sink.
pub trait BackendPresenter {
    /// Platform-specific error type.
    type Error: fmt::Debug + fmt::Display;

    /// Present a full grid. Synchronous: returns after the frame is written.
    fn present(&mut self, grid: &Grid) -> Result<(), Self::Error>;

    /// Set the window title. Backends skip the write when it is unchanged.
    fn set_title(&mut self, title: &str) -> Result<(), Self::Error>;

    fn set_cursor_visible(&mut self, visible: bool) -> Result<(), Self::Error>;

    /// Move the cursor to a grid cell.
    fn set_cursor_position(&mut self, x: u16, y: u16) -> Result<(), Self::Error>;
}

/// Unified backend: surface, clock, polled input, key hook, and presenter.
///
/// The runtime `Engine` is generic over this trait.
pub trait Backend: BackendSurface {
    /// Clock implementation.
    type Clock: BackendClock;
    /// Polled input implementation.
    type Input: InputSource;
    /// Presenter implementation.
    type Presenter: BackendPresenter;
    /// Event-driven key listener handed to the capture thread.
    type Hook: KeyHook;

    fn clock(&self) -> &Self::Clock;

    fn input(&mut self) -> &mut Self::Input;

    fn presenter(&mut self) -> &mut Self::Presenter;

    /// Hand the key hook to the caller. `None` after the first call, or if
    /// this backend has no event-driven key source.
    fn take_key_hook(&mut self) -> Option<Self::Hook>;
}
