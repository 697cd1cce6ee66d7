#![forbid(unsafe_code)]

//! In-memory backend for tests and offscreen runs.
//!
//! [`HeadlessBackend`] implements every backend trait without a terminal:
//! presented grids and titles are recorded, input is scripted through a
//! [`HeadlessController`] that can be moved to another thread, and time comes
//! from either the real monotonic clock or a [`ManualClock`] that advances
//! only when the engine sleeps or a test says so.
//!
//! The controller feeds both input paths the way a real platform would: a
//! key press sets the raw key table sampled each frame *and* sends a down
//! notification to the capture thread.

use std::io;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use glyphloop_backend::{
    Backend, BackendClock, BackendPresenter, BackendSurface, SurfaceRequest,
};
use glyphloop_core::{
    ChannelKeyHook, ChannelKeySender, InputSource, KEY_COUNT, KeyCode, MouseButtons, PlatformEvent,
};
use glyphloop_render::Grid;
use web_time::{Duration, Instant};

// ── Clock ────────────────────────────────────────────────────────────────

/// Shared manual time source.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Clock of a [`HeadlessBackend`].
#[derive(Debug, Clone)]
pub enum HeadlessClock {
    /// Wall-clock time; sleeps really sleep.
    Real(Instant),
    /// Time only moves on `sleep` or [`ManualClock::advance`].
    Manual(ManualClock),
}

impl BackendClock for HeadlessClock {
    fn now_mono(&self) -> Duration {
        match self {
            Self::Real(epoch) => epoch.elapsed(),
            Self::Manual(clock) => clock.now(),
        }
    }

    fn sleep(&self, duration: Duration) {
        match self {
            Self::Real(_) => std::thread::sleep(duration),
            Self::Manual(clock) => clock.advance(duration),
        }
    }
}

// ── Input ────────────────────────────────────────────────────────────────

type KeyTable = Arc<Mutex<[bool; KEY_COUNT]>>;

/// Polled input fed by a [`HeadlessController`].
#[derive(Debug)]
pub struct HeadlessInput {
    keys: KeyTable,
    events: mpsc::Receiver<PlatformEvent>,
}

impl InputSource for HeadlessInput {
    fn sample_keys(&mut self, out: &mut [bool; KEY_COUNT]) {
        *out = *self.keys.lock().unwrap_or_else(|e| e.into_inner());
    }

    fn poll_platform_event(&mut self) -> Option<PlatformEvent> {
        self.events.try_recv().ok()
    }
}

/// Scripts input into a [`HeadlessBackend`] from any thread.
#[derive(Debug, Clone)]
pub struct HeadlessController {
    keys: KeyTable,
    events: mpsc::Sender<PlatformEvent>,
    hook: ChannelKeySender,
}

impl HeadlessController {
    /// Hold `code` down on both input paths.
    pub fn press(&self, code: impl Into<KeyCode>) {
        let code = code.into();
        self.set_raw(code, true);
        self.hook.down(code);
    }

    /// Release `code` on both input paths.
    pub fn release(&self, code: impl Into<KeyCode>) {
        let code = code.into();
        self.set_raw(code, false);
        self.hook.up(code);
    }

    /// Set the polled state of `code` only.
    pub fn set_raw(&self, code: impl Into<KeyCode>, down: bool) {
        let code = code.into();
        self.keys.lock().unwrap_or_else(|e| e.into_inner())[code.index()] = down;
    }

    /// Sender feeding the capture thread only.
    #[must_use]
    pub fn hook(&self) -> &ChannelKeySender {
        &self.hook
    }

    /// Queue a platform event. Returns `false` once the backend is gone.
    pub fn event(&self, event: PlatformEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn mouse_move(&self, x: i32, y: i32) -> bool {
        self.event(PlatformEvent::MouseMoved { x, y })
    }

    pub fn mouse_buttons(&self, mask: MouseButtons) -> bool {
        self.event(PlatformEvent::MouseButtons { mask })
    }

    pub fn wheel(&self, forward: bool) -> bool {
        self.event(PlatformEvent::MouseWheel { forward })
    }

    pub fn focus(&self, focused: bool) -> bool {
        self.event(PlatformEvent::Focus(focused))
    }

    pub fn resize(&self, columns: u16, rows: u16) -> bool {
        self.event(PlatformEvent::Resize { columns, rows })
    }
}

// ── Presenter ────────────────────────────────────────────────────────────

/// Recording presenter.
#[derive(Debug, Default)]
pub struct HeadlessPresenter {
    last: Option<Grid>,
    frames: u64,
    titles: Vec<String>,
    cursor_visible: bool,
    cursor_position: Option<(u16, u16)>,
    fail_after: Option<u64>,
}

impl HeadlessPresenter {
    /// The most recently presented grid.
    #[must_use]
    pub fn last_frame(&self) -> Option<&Grid> {
        self.last.as_ref()
    }

    #[must_use]
    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    /// Every distinct title set, in order.
    #[must_use]
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    #[must_use]
    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    #[must_use]
    pub fn cursor_position(&self) -> Option<(u16, u16)> {
        self.cursor_position
    }
}

impl BackendPresenter for HeadlessPresenter {
    type Error = io::Error;

    fn present(&mut self, grid: &Grid) -> io::Result<()> {
        if self.fail_after.is_some_and(|n| self.frames >= n) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "presenter closed"));
        }
        match self.last.as_mut() {
            Some(last) => last.clone_from(grid),
            None => self.last = Some(grid.clone()),
        }
        self.frames += 1;
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> io::Result<()> {
        if self.titles.last().map(String::as_str) != Some(title) {
            self.titles.push(title.to_owned());
        }
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()> {
        self.cursor_visible = visible;
        Ok(())
    }

    fn set_cursor_position(&mut self, x: u16, y: u16) -> io::Result<()> {
        self.cursor_position = Some((x, y));
        Ok(())
    }
}

// ── Backend ──────────────────────────────────────────────────────────────

/// Terminal-free backend.
#[derive(Debug)]
pub struct HeadlessBackend {
    clock: HeadlessClock,
    input: HeadlessInput,
    presenter: HeadlessPresenter,
    hook: Option<ChannelKeyHook>,
    terminal: (u16, u16),
    request: Option<SurfaceRequest>,
    open: bool,
    opens: u32,
    closes: u32,
    open_error: Option<String>,
}

impl HeadlessBackend {
    /// A backend on the real clock with a 200x60 virtual terminal, plus the
    /// controller that scripts its input.
    #[must_use]
    pub fn pair() -> (Self, HeadlessController) {
        let keys: KeyTable = Arc::new(Mutex::new([false; KEY_COUNT]));
        let (event_tx, event_rx) = mpsc::channel();
        let (hook, hook_tx) = ChannelKeyHook::pair();
        let backend = Self {
            clock: HeadlessClock::Real(Instant::now()),
            input: HeadlessInput {
                keys: Arc::clone(&keys),
                events: event_rx,
            },
            presenter: HeadlessPresenter::default(),
            hook: Some(hook),
            terminal: (200, 60),
            request: None,
            open: false,
            opens: 0,
            closes: 0,
            open_error: None,
        };
        let controller = HeadlessController {
            keys,
            events: event_tx,
            hook: hook_tx,
        };
        (backend, controller)
    }

    /// Drive time from `clock` instead of the wall clock.
    #[must_use]
    pub fn with_manual_clock(mut self, clock: ManualClock) -> Self {
        self.clock = HeadlessClock::Manual(clock);
        self
    }

    #[must_use]
    pub fn with_terminal_size(mut self, columns: u16, rows: u16) -> Self {
        self.terminal = (columns, rows);
        self
    }

    /// Make the key hook fail to install.
    #[must_use]
    pub fn with_failing_hook(mut self, message: impl Into<String>) -> Self {
        self.hook = self.hook.take().map(|h| h.with_install_error(message));
        self
    }

    /// Make [`open`](BackendSurface::open) fail.
    #[must_use]
    pub fn with_open_error(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    /// Make `present` fail once `frames` frames have been presented.
    #[must_use]
    pub fn with_present_failure_after(mut self, frames: u64) -> Self {
        self.presenter.fail_after = Some(frames);
        self
    }

    #[must_use]
    pub fn presenter_ref(&self) -> &HeadlessPresenter {
        &self.presenter
    }

    /// The request passed to the last `open`.
    #[must_use]
    pub fn surface_request(&self) -> Option<&SurfaceRequest> {
        self.request.as_ref()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// How many times the surface was opened and restored.
    #[must_use]
    pub fn open_close_counts(&self) -> (u32, u32) {
        (self.opens, self.closes)
    }
}

impl BackendSurface for HeadlessBackend {
    type Error = io::Error;

    fn terminal_size(&self) -> io::Result<(u16, u16)> {
        Ok(self.terminal)
    }

    fn open(&mut self, request: &SurfaceRequest) -> io::Result<()> {
        if let Some(message) = &self.open_error {
            return Err(io::Error::other(message.clone()));
        }
        if self.open {
            return Err(io::Error::other("headless surface already open"));
        }
        self.open = true;
        self.opens += 1;
        self.request = Some(request.clone());
        self.presenter.set_title(&request.title)
    }

    fn close(&mut self) -> io::Result<()> {
        if self.open {
            self.open = false;
            self.closes += 1;
        }
        Ok(())
    }
}

impl Backend for HeadlessBackend {
    type Clock = HeadlessClock;
    type Input = HeadlessInput;
    type Presenter = HeadlessPresenter;
    type Hook = ChannelKeyHook;

    fn clock(&self) -> &Self::Clock {
        &self.clock
    }

    fn input(&mut self) -> &mut Self::Input {
        &mut self.input
    }

    fn presenter(&mut self) -> &mut Self::Presenter {
        &mut self.presenter
    }

    fn take_key_hook(&mut self) -> Option<Self::Hook> {
        self.hook.take()
    }
}
