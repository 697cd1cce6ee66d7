#![forbid(unsafe_code)]

//! The main loop.
//!
//! An [`Engine`] owns a backend, a grid, and the input machinery, and drives
//! a [`Game`] through its lifecycle: `init` once, `update` every frame,
//! `destroy` once. Each iteration runs the same fixed sequence:
//!
//! 1. stop if a quit has been requested;
//! 2. measure the frame delta and update the FPS average;
//! 3. sample polled input (keys, mouse, focus, resize);
//! 4. lock the event buffer, call `update`, clear the buffer, unlock;
//! 5. apply requests made during `update` and present the grid;
//! 6. sleep until the next frame deadline.
//!
//! The capture thread appends key events concurrently with all of this. It
//! blocks only on the buffer lock, which the loop holds across step 4, so
//! every event lands in exactly one frame's [`Context::events`].
//!
//! # Example
//!
//! ```ignore
//! use glyphloop_core::Key;
//! use glyphloop_render::{Attr, Draw};
//! use glyphloop_runtime::{Context, Engine, EngineConfig, Flow, Game};
//!
//! struct Hello;
//!
//! impl Game for Hello {
//!     fn init(&mut self, _ctx: &mut Context<'_>) {}
//!
//!     fn update(&mut self, ctx: &mut Context<'_>, _dt: f64) -> Flow {
//!         ctx.grid_mut().draw_text(0, 0, "hello", Attr::WHITE);
//!         if ctx.key_named(Key::Escape).pressed {
//!             return Flow::Exit;
//!         }
//!         Flow::Continue
//!     }
//! }
//!
//! let mut engine = Engine::new(backend, EngineConfig::default().windowed(40, 10));
//! engine.run(&mut Hello)?;
//! ```

use core::fmt::Write as _;
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use glyphloop_backend::{Backend, BackendClock, BackendPresenter};
use glyphloop_core::{
    CaptureHandle, EventCapture, InputBuffer, InputSampler, Key, KeyCode, KeyEvent, KeyState,
    MouseButton, MousePosition, PlatformEvent,
};
use glyphloop_render::Grid;
use web_time::Duration;

use crate::config::{EngineConfig, ScreenMode};
use crate::error::{EngineError, Result, SetupError};
use crate::lifecycle::{EngineState, ShutdownHandle};
use crate::routine::{RoutineToken, Routines};
use crate::scheduler::{FrameRate, FrameScheduler};

/// What the loop should do after an `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Continue,
    /// Drain and stop, as if [`Context::quit`] had been called.
    Exit,
}

/// Client code run by an [`Engine`].
pub trait Game {
    /// Called once after the surface is open and the grid allocated.
    fn init(&mut self, ctx: &mut Context<'_>);

    /// Called once per frame with the seconds elapsed since the last frame.
    fn update(&mut self, ctx: &mut Context<'_>, dt: f64) -> Flow;

    /// Called exactly once when the engine drains, before the surface is
    /// restored.
    fn destroy(&mut self, ctx: &mut Context<'_>) {
        let _ = ctx;
    }
}

/// Changes requested through a [`Context`], applied after the callback
/// returns.
#[derive(Debug, Default)]
struct Requests {
    frame_rate: Option<FrameRate>,
    title: Option<String>,
    cursor_visible: Option<bool>,
    cursor_position: Option<(u16, u16)>,
}

#[derive(Debug, Clone, Copy)]
struct FrameInfo {
    delta: f64,
    average_fps: f64,
    elapsed: Duration,
    frame: u64,
    rate: FrameRate,
}

/// Everything a [`Game`] callback may read or change.
///
/// Input queries reflect the state sampled at the start of the current
/// frame. Setters take effect once the callback returns.
pub struct Context<'a> {
    input: &'a InputSampler,
    events: &'a [KeyEvent],
    grid: &'a mut Grid,
    info: FrameInfo,
    requests: &'a mut Requests,
    shutdown: &'a ShutdownHandle,
    routines: &'a Routines,
}

impl Context<'_> {
    // ── Input ────────────────────────────────────────────────────────────

    /// This frame's polled state of `code`.
    #[must_use]
    pub fn key(&self, code: KeyCode) -> KeyState {
        self.input.key(code)
    }

    #[must_use]
    pub fn key_named(&self, key: Key) -> KeyState {
        self.input.key(key.code())
    }

    /// The code whose polled state changed most recently, or
    /// [`KeyCode::EMPTY`] before any key has changed.
    #[must_use]
    pub fn last_key_code(&self) -> KeyCode {
        self.input.last_key()
    }

    /// [`last_key_code`](Self::last_key_code) as a named key, when it has one.
    #[must_use]
    pub fn last_key(&self) -> Option<Key> {
        self.input.last_key().named()
    }

    /// Mouse position in grid cells.
    #[must_use]
    pub fn mouse(&self) -> MousePosition {
        self.input.mouse_position()
    }

    #[must_use]
    pub fn mouse_button(&self, button: MouseButton) -> KeyState {
        self.input.mouse_button(button)
    }

    /// Whether the wheel moved forward since the last frame.
    #[must_use]
    pub fn wheel_forward(&self) -> bool {
        self.input.mouse_button(MouseButton::WheelForward).pressed
    }

    /// Whether the wheel moved backward since the last frame.
    #[must_use]
    pub fn wheel_backward(&self) -> bool {
        self.input.mouse_button(MouseButton::WheelBackward).pressed
    }

    #[must_use]
    pub fn in_focus(&self) -> bool {
        self.input.in_focus()
    }

    /// Key events captured since the previous frame, in arrival order.
    #[must_use]
    pub fn events(&self) -> &[KeyEvent] {
        self.events
    }

    /// Platform events drained this frame, in arrival order.
    #[must_use]
    pub fn platform_events(&self) -> &[PlatformEvent] {
        self.input.frame_events()
    }

    // ── Grid ─────────────────────────────────────────────────────────────

    #[must_use]
    pub fn grid(&self) -> &Grid {
        self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        self.grid
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.grid.width()
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.grid.height()
    }

    // ── Timing ───────────────────────────────────────────────────────────

    /// Seconds since the previous frame began.
    #[must_use]
    pub fn delta_time(&self) -> f64 {
        self.info.delta
    }

    /// Frames per second averaged over the last ten frames.
    #[must_use]
    pub fn average_fps(&self) -> f64 {
        self.info.average_fps
    }

    /// Seconds since [`Engine::run`] began.
    #[must_use]
    pub fn run_time(&self) -> f64 {
        self.info.elapsed.as_secs_f64()
    }

    /// Time since [`Engine::run`] began; the clock [`Timer`](crate::Timer)s
    /// are driven by.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.info.elapsed
    }

    /// Frames completed before this one.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.info.frame
    }

    #[must_use]
    pub fn frame_rate(&self) -> FrameRate {
        self.requests.frame_rate.unwrap_or(self.info.rate)
    }

    // ── Control ──────────────────────────────────────────────────────────

    /// Stop after the current frame.
    pub fn quit(&mut self) {
        self.shutdown.request_shutdown();
    }

    #[must_use]
    pub fn is_quitting(&self) -> bool {
        self.shutdown.is_shutdown_requested()
    }

    /// Change the frame rate from the next frame on. Invalid rates are
    /// logged and ignored.
    pub fn set_frame_rate(&mut self, rate: FrameRate) {
        self.requests.frame_rate = Some(rate);
    }

    /// Change the base window title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.requests.title = Some(title.into());
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.requests.cursor_visible = Some(visible);
    }

    /// Move the cursor to grid cell `(x, y)`.
    pub fn set_cursor_position(&mut self, x: u16, y: u16) {
        self.requests.cursor_position = Some((x, y));
    }

    /// Run `routine` on a background thread.
    ///
    /// The routine's token is cancelled once the engine has drained. See
    /// [`routine`](crate::routine).
    ///
    /// # Errors
    ///
    /// Fails when the thread cannot be spawned.
    pub fn spawn_routine<F, T>(&self, routine: F) -> io::Result<JoinHandle<T>>
    where
        F: FnOnce(RoutineToken) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.routines.spawn(routine)
    }
}

/// State that exists only while a run is in progress.
struct Session {
    grid: Grid,
    buffer: Arc<InputBuffer>,
    capture: Option<CaptureHandle>,
    sampler: InputSampler,
    scheduler: FrameScheduler,
    started: Duration,
    title: String,
    shown_title: String,
    routines: Routines,
}

/// Runs a [`Game`] on a [`Backend`].
pub struct Engine<B: Backend> {
    backend: B,
    config: EngineConfig,
    shutdown: ShutdownHandle,
    ran: bool,
}

impl<B: Backend> Engine<B> {
    #[must_use]
    pub fn new(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            config,
            shutdown: ShutdownHandle::new(),
            ran: false,
        }
    }

    /// A handle other threads can use to stop the loop or wait for it.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.shutdown.state()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Run `game` until it exits or a shutdown is requested.
    ///
    /// An engine runs once; later calls fail with
    /// [`EngineError::AlreadyRun`].
    ///
    /// # Errors
    ///
    /// Setup failures are returned before `init` is called. A failure to
    /// present a frame ends the loop through the normal drain and is
    /// returned once teardown has finished.
    pub fn run<G: Game + ?Sized>(&mut self, game: &mut G) -> Result<()> {
        if self.ran {
            return Err(EngineError::AlreadyRun);
        }
        self.ran = true;

        let span = tracing::info_span!("engine", title = %self.config.title);
        let _enter = span.enter();

        let mut session = match self.setup() {
            Ok(session) => session,
            Err(err) => {
                tracing::error!(error = %err, "engine setup failed");
                self.shutdown.transition(EngineState::Stopped);
                return Err(err.into());
            }
        };
        self.shutdown.transition(EngineState::Running);
        tracing::info!(
            width = session.grid.width(),
            height = session.grid.height(),
            rate = %session.scheduler.rate(),
            capture = session.capture.is_some(),
            "engine running"
        );

        let mut outcome = self.run_loop(game, &mut session);
        if outcome.is_err() {
            self.shutdown.request_shutdown();
        }

        self.shutdown.transition(EngineState::Draining);
        let frames = session.scheduler.iterations();
        let run_time = self.backend.clock().now_mono().saturating_sub(session.started);
        self.teardown(game, session);
        if let Err(err) = self.backend.close() {
            tracing::error!(error = %err, "surface restore failed");
            if outcome.is_ok() {
                outcome = Err(EngineError::Restore(err.to_string()));
            }
        }
        self.shutdown.transition(EngineState::Stopped);
        tracing::info!(frames, run_time_s = run_time.as_secs_f64(), "engine stopped");
        outcome
    }

    fn setup(&mut self) -> Result<Session, SetupError> {
        self.config.validate()?;
        let (width, height) = self.grid_size()?;

        let request = self.config.surface_request();
        self.backend
            .open(&request)
            .map_err(|err| SetupError::Surface(err.to_string()))?;

        let buffer = Arc::new(InputBuffer::new());
        let capture = if self.config.capture_keys {
            self.spawn_capture(&buffer)
        } else {
            None
        };

        let mut scheduler = FrameScheduler::new(self.config.frame_rate);
        let started = self.backend.clock().now_mono();
        scheduler.start(started);

        Ok(Session {
            grid: Grid::new(width, height),
            buffer,
            capture,
            sampler: InputSampler::new(),
            scheduler,
            started,
            title: self.config.title.clone(),
            shown_title: request.title,
            routines: Routines::default(),
        })
    }

    fn grid_size(&self) -> Result<(u16, u16), SetupError> {
        let (columns, rows) = self
            .backend
            .terminal_size()
            .map_err(|err| SetupError::Surface(err.to_string()))?;
        let (cell_width, cell_height) = (self.config.cell_width, self.config.cell_height);
        let too_large = |width: u16, height: u16| SetupError::SurfaceTooLarge {
            columns: width,
            rows: height,
            cell_width,
            cell_height,
            terminal_columns: columns,
            terminal_rows: rows,
        };
        match self.config.screen {
            ScreenMode::Windowed { width, height } => {
                let fits = u32::from(width) * u32::from(cell_width) <= u32::from(columns)
                    && u32::from(height) * u32::from(cell_height) <= u32::from(rows);
                if fits {
                    Ok((width, height))
                } else {
                    Err(too_large(width, height))
                }
            }
            ScreenMode::Fullscreen => {
                let size = (columns / cell_width, rows / cell_height);
                if size.0 == 0 || size.1 == 0 {
                    Err(too_large(1, 1))
                } else {
                    Ok(size)
                }
            }
        }
    }

    fn spawn_capture(&mut self, buffer: &Arc<InputBuffer>) -> Option<CaptureHandle> {
        let Some(hook) = self.backend.take_key_hook() else {
            tracing::debug!("backend has no key hook; using polled input only");
            return None;
        };
        match EventCapture::spawn(hook, Arc::clone(buffer)) {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::warn!(error = %err, "could not start the capture thread; continuing on polled input");
                None
            }
        }
    }

    fn run_loop<G: Game + ?Sized>(&mut self, game: &mut G, session: &mut Session) -> Result<()> {
        let mut requests = Requests::default();
        {
            let info = frame_info(session, Duration::ZERO);
            let mut ctx = Context {
                input: &session.sampler,
                events: &[],
                grid: &mut session.grid,
                info,
                requests: &mut requests,
                shutdown: &self.shutdown,
                routines: &session.routines,
            };
            game.init(&mut ctx);
        }
        self.apply_requests(session, &mut requests)?;

        let fullscreen = matches!(self.config.screen, ScreenMode::Fullscreen);
        let (cell_width, cell_height) = (self.config.cell_width, self.config.cell_height);

        while !self.shutdown.is_shutdown_requested() {
            let now = self.backend.clock().now_mono();
            let dt = session.scheduler.begin_iteration(now);

            session.sampler.sample(self.backend.input());
            if let Some((columns, rows)) = session.sampler.take_resize()
                && fullscreen
            {
                session.grid.resize(columns / cell_width, rows / cell_height);
                tracing::debug!(
                    width = session.grid.width(),
                    height = session.grid.height(),
                    "grid resized"
                );
            }

            let elapsed = now.saturating_sub(session.started);
            let flow = {
                let mut guard = session.buffer.lock();
                let info = frame_info(session, elapsed);
                let flow = {
                    let mut ctx = Context {
                        input: &session.sampler,
                        events: guard.events(),
                        grid: &mut session.grid,
                        info,
                        requests: &mut requests,
                        shutdown: &self.shutdown,
                        routines: &session.routines,
                    };
                    game.update(&mut ctx, dt)
                };
                guard.clear();
                flow
            };
            if flow == Flow::Exit {
                self.shutdown.request_shutdown();
            }

            self.apply_requests(session, &mut requests)?;
            self.present(session)?;

            if let Some(sleep) = session.scheduler.pace(self.backend.clock().now_mono()) {
                self.backend.clock().sleep(sleep);
            }
        }
        Ok(())
    }

    fn apply_requests(&mut self, session: &mut Session, requests: &mut Requests) -> Result<()> {
        if let Some(rate) = requests.frame_rate.take() {
            if session.scheduler.set_rate(rate) {
                tracing::debug!(%rate, "frame rate changed");
            } else {
                tracing::warn!(%rate, "ignoring invalid frame rate");
            }
        }
        if let Some(title) = requests.title.take() {
            session.title = title;
        }
        let presenter = self.backend.presenter();
        if let Some(visible) = requests.cursor_visible.take() {
            presenter.set_cursor_visible(visible).map_err(present_error)?;
        }
        if let Some((x, y)) = requests.cursor_position.take() {
            presenter.set_cursor_position(x, y).map_err(present_error)?;
        }
        Ok(())
    }

    fn present(&mut self, session: &mut Session) -> Result<()> {
        let mut title = String::with_capacity(session.title.len() + 16);
        if session.scheduler.rate().is_limited() {
            let _ = write!(title, "{} - FPS: {:4.0}", session.title, session.scheduler.average_fps());
        } else {
            title.push_str(&session.title);
        }

        let presenter = self.backend.presenter();
        if title != session.shown_title {
            presenter.set_title(&title).map_err(present_error)?;
            session.shown_title = title;
        }
        presenter.present(&session.grid).map_err(present_error)
    }

    fn teardown<G: Game + ?Sized>(&mut self, game: &mut G, mut session: Session) {
        let span = tracing::debug_span!("teardown");
        let _enter = span.enter();

        let mut requests = Requests::default();
        let elapsed = self
            .backend
            .clock()
            .now_mono()
            .saturating_sub(session.started);
        {
            let mut guard = session.buffer.lock();
            let info = frame_info(&session, elapsed);
            let mut ctx = Context {
                input: &session.sampler,
                events: guard.events(),
                grid: &mut session.grid,
                info,
                requests: &mut requests,
                shutdown: &self.shutdown,
                routines: &session.routines,
            };
            game.destroy(&mut ctx);
            drop(ctx);
            guard.clear();
        }

        if let Some(capture) = session.capture.take() {
            capture.stop();
        }
        session.routines.cancel();
        drop(session);
        tracing::debug!("game destroyed and grid released");
    }
}

impl<B: Backend> Drop for Engine<B> {
    fn drop(&mut self) {
        // A panic inside a callback unwinds past `run` without draining.
        if matches!(
            self.shutdown.state(),
            EngineState::Running | EngineState::Draining
        ) {
            tracing::error!("engine dropped while running; restoring the surface");
            let _ = self.backend.close();
            self.shutdown.transition(EngineState::Stopped);
        }
    }
}

fn frame_info(session: &Session, elapsed: Duration) -> FrameInfo {
    FrameInfo {
        delta: session.scheduler.delta(),
        average_fps: session.scheduler.average_fps(),
        elapsed,
        frame: session.scheduler.iterations().saturating_sub(1),
        rate: session.scheduler.rate(),
    }
}

fn present_error<E: core::fmt::Display>(err: E) -> EngineError {
    tracing::error!(error = %err, "presentation failed");
    EngineError::Present(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessBackend, ManualClock};
    use glyphloop_render::{Attr, Cell};

    /// Counts lifecycle calls and runs `step` as the update body.
    struct Scripted<F> {
        inits: u32,
        updates: u64,
        destroys: u32,
        step: F,
    }

    fn scripted<F>(step: F) -> Scripted<F>
    where
        F: FnMut(&mut Context<'_>, u64) -> Flow,
    {
        Scripted {
            inits: 0,
            updates: 0,
            destroys: 0,
            step,
        }
    }

    impl<F> Game for Scripted<F>
    where
        F: FnMut(&mut Context<'_>, u64) -> Flow,
    {
        fn init(&mut self, _ctx: &mut Context<'_>) {
            self.inits += 1;
        }

        fn update(&mut self, ctx: &mut Context<'_>, _dt: f64) -> Flow {
            let n = self.updates;
            self.updates += 1;
            (self.step)(ctx, n)
        }

        fn destroy(&mut self, _ctx: &mut Context<'_>) {
            self.destroys += 1;
        }
    }

    fn manual_engine(config: EngineConfig) -> Engine<HeadlessBackend> {
        let (backend, _controller) = HeadlessBackend::pair();
        Engine::new(
            backend.with_manual_clock(ManualClock::new()),
            config.capture_keys(false),
        )
    }

    #[test]
    fn runs_until_exit_and_tears_down_once() {
        let mut engine = manual_engine(EngineConfig::default().windowed(10, 4));
        let mut game = scripted(|_, n| if n == 4 { Flow::Exit } else { Flow::Continue });
        engine.run(&mut game).unwrap();
        assert_eq!((game.inits, game.updates, game.destroys), (1, 5, 1));
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.backend().open_close_counts(), (1, 1));
        assert_eq!(engine.backend().presenter_ref().frames_presented(), 5);
    }

    #[test]
    fn second_run_is_rejected() {
        let mut engine = manual_engine(EngineConfig::default());
        let mut game = scripted(|_, _| Flow::Exit);
        engine.run(&mut game).unwrap();
        assert!(matches!(engine.run(&mut game), Err(EngineError::AlreadyRun)));
        assert_eq!(game.inits, 1);
    }

    #[test]
    fn oversized_window_fails_before_opening() {
        let (backend, _controller) = HeadlessBackend::pair();
        let mut engine = Engine::new(
            backend.with_terminal_size(80, 24),
            EngineConfig::default().windowed(50, 20).cell_size(2, 1),
        );
        let mut game = scripted(|_, _| Flow::Exit);
        let err = engine.run(&mut game).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Setup(SetupError::SurfaceTooLarge {
                columns: 50,
                terminal_columns: 80,
                ..
            })
        ));
        assert_eq!(game.inits, 0);
        assert_eq!(engine.backend().open_close_counts(), (0, 0));
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn invalid_config_is_a_setup_error() {
        let mut engine = manual_engine(EngineConfig::default().frame_rate(FrameRate::Limited(0.0)));
        let err = engine.run(&mut scripted(|_, _| Flow::Exit)).unwrap_err();
        assert!(matches!(err, EngineError::Setup(SetupError::InvalidConfig(_))));
    }

    #[test]
    fn open_failure_is_a_setup_error() {
        let (backend, _controller) = HeadlessBackend::pair();
        let mut engine = Engine::new(backend.with_open_error("no tty"), EngineConfig::default());
        let err = engine.run(&mut scripted(|_, _| Flow::Exit)).unwrap_err();
        assert!(matches!(err, EngineError::Setup(SetupError::Surface(ref m)) if m == "no tty"));
    }

    #[test]
    fn fullscreen_divides_the_terminal_by_the_cell_scale() {
        let (backend, _controller) = HeadlessBackend::pair();
        let mut engine = Engine::new(
            backend
                .with_manual_clock(ManualClock::new())
                .with_terminal_size(81, 25),
            EngineConfig::default().fullscreen().cell_size(2, 2),
        );
        let mut size = (0, 0);
        engine
            .run(&mut scripted(|ctx, _| {
                size = (ctx.width(), ctx.height());
                Flow::Exit
            }))
            .unwrap();
        assert_eq!(size, (40, 12));
    }

    #[test]
    fn fullscreen_follows_resizes() {
        let (backend, controller) = HeadlessBackend::pair();
        let mut engine = Engine::new(
            backend
                .with_manual_clock(ManualClock::new())
                .with_terminal_size(20, 10),
            EngineConfig::default().fullscreen().capture_keys(false),
        );
        let mut sizes = Vec::new();
        engine
            .run(&mut scripted(|ctx, n| {
                sizes.push((ctx.width(), ctx.height()));
                if n == 0 {
                    controller.resize(30, 12);
                }
                if n == 2 { Flow::Exit } else { Flow::Continue }
            }))
            .unwrap();
        assert_eq!(sizes, [(20, 10), (30, 12), (30, 12)]);
    }

    #[test]
    fn windowed_ignores_resizes() {
        let (backend, controller) = HeadlessBackend::pair();
        let mut engine = Engine::new(
            backend.with_manual_clock(ManualClock::new()),
            EngineConfig::default().windowed(8, 3).capture_keys(false),
        );
        controller.resize(100, 40);
        let mut sizes = Vec::new();
        engine
            .run(&mut scripted(|ctx, n| {
                sizes.push(ctx.grid().size());
                if n == 1 { Flow::Exit } else { Flow::Continue }
            }))
            .unwrap();
        assert_eq!(sizes, [(8, 3), (8, 3)]);
    }

    #[test]
    fn quit_from_init_skips_update() {
        struct QuitEarly {
            updates: u32,
            destroys: u32,
        }
        impl Game for QuitEarly {
            fn init(&mut self, ctx: &mut Context<'_>) {
                ctx.quit();
            }
            fn update(&mut self, _ctx: &mut Context<'_>, _dt: f64) -> Flow {
                self.updates += 1;
                Flow::Continue
            }
            fn destroy(&mut self, _ctx: &mut Context<'_>) {
                self.destroys += 1;
            }
        }
        let mut engine = manual_engine(EngineConfig::default());
        let mut game = QuitEarly {
            updates: 0,
            destroys: 0,
        };
        engine.run(&mut game).unwrap();
        assert_eq!((game.updates, game.destroys), (0, 1));
        assert_eq!(engine.backend().open_close_counts(), (1, 1));
    }

    #[test]
    fn presented_grid_holds_what_update_drew() {
        let mut engine = manual_engine(EngineConfig::default().windowed(4, 2));
        let cell = Cell::new('@', Attr::WHITE);
        engine
            .run(&mut scripted(|ctx, _| {
                ctx.grid_mut().set(3, 1, cell);
                Flow::Exit
            }))
            .unwrap();
        let frame = engine.backend().presenter_ref().last_frame().unwrap();
        assert_eq!(frame.get(3, 1), Some(cell));
    }

    #[test]
    fn limited_title_carries_the_fps_reading() {
        let mut engine = manual_engine(
            EngineConfig::default()
                .title("demo")
                .frame_rate(FrameRate::Limited(50.0)),
        );
        let mut fps = 0.0;
        engine
            .run(&mut scripted(|ctx, n| {
                fps = ctx.average_fps();
                if n == 15 { Flow::Exit } else { Flow::Continue }
            }))
            .unwrap();
        assert!((fps - 50.0).abs() < 1e-6);
        let titles = engine.backend().presenter_ref().titles();
        assert_eq!(titles.first().map(String::as_str), Some("demo"));
        assert_eq!(titles.last().map(String::as_str), Some("demo - FPS:   50"));
    }

    #[test]
    fn unlimited_title_is_bare_and_set_title_applies() {
        let mut engine = manual_engine(
            EngineConfig::default()
                .title("demo")
                .frame_rate(FrameRate::Unlimited),
        );
        engine
            .run(&mut scripted(|ctx, n| {
                if n == 1 {
                    ctx.set_title("renamed");
                }
                if n == 3 { Flow::Exit } else { Flow::Continue }
            }))
            .unwrap();
        assert_eq!(
            engine.backend().presenter_ref().titles(),
            ["demo".to_owned(), "renamed".to_owned()]
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn frame_rate_changes_apply_from_the_next_frame() {
        let mut engine = manual_engine(EngineConfig::default().frame_rate(FrameRate::Unlimited));
        let mut rates = Vec::new();
        engine
            .run(&mut scripted(|ctx, n| {
                rates.push(ctx.frame_rate());
                if n == 0 {
                    ctx.set_frame_rate(FrameRate::Limited(25.0));
                }
                if n == 1 {
                    ctx.set_frame_rate(FrameRate::Limited(f64::NAN));
                }
                if n == 2 {
                    // Frame length would not fit in a Duration.
                    ctx.set_frame_rate(FrameRate::Limited(1e-20));
                }
                if n == 3 { Flow::Exit } else { Flow::Continue }
            }))
            .unwrap();
        assert_eq!(rates[0], FrameRate::Unlimited);
        assert_eq!(rates[2], FrameRate::Limited(25.0));
        assert_eq!(rates[3], FrameRate::Limited(25.0));
        assert!(logs_contain("ignoring invalid frame rate"));
        assert!(logs_contain("engine stopped"));
    }

    #[test]
    fn cursor_requests_reach_the_presenter() {
        let mut engine = manual_engine(EngineConfig::default());
        engine
            .run(&mut scripted(|ctx, _| {
                ctx.set_cursor_visible(true);
                ctx.set_cursor_position(2, 3);
                Flow::Exit
            }))
            .unwrap();
        let presenter = engine.backend().presenter_ref();
        assert!(presenter.cursor_visible());
        assert_eq!(presenter.cursor_position(), Some((2, 3)));
    }

    #[test]
    fn present_failure_drains_and_is_returned() {
        let (backend, _controller) = HeadlessBackend::pair();
        let mut engine = Engine::new(
            backend
                .with_manual_clock(ManualClock::new())
                .with_present_failure_after(3),
            EngineConfig::default().capture_keys(false),
        );
        let mut game = scripted(|_, _| Flow::Continue);
        let err = engine.run(&mut game).unwrap_err();
        assert!(matches!(err, EngineError::Present(_)));
        assert_eq!((game.updates, game.destroys), (4, 1));
        assert_eq!(engine.backend().open_close_counts(), (1, 1));
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[test]
    fn run_time_follows_the_engine_clock() {
        let mut engine = manual_engine(EngineConfig::default().frame_rate(FrameRate::Limited(10.0)));
        let mut times = Vec::new();
        engine
            .run(&mut scripted(|ctx, n| {
                times.push((ctx.frame_count(), ctx.run_time()));
                if n == 2 { Flow::Exit } else { Flow::Continue }
            }))
            .unwrap();
        assert_eq!(times[0].0, 0);
        assert!((times[2].1 - 0.2).abs() < 1e-9);
    }

    #[test]
    fn routines_are_cancelled_when_the_engine_drains() {
        let mut engine = manual_engine(EngineConfig::default());
        let mut handle = None;
        engine
            .run(&mut scripted(|ctx, n| {
                if n == 0 {
                    handle = Some(
                        ctx.spawn_routine(|token| {
                            let mut ticks = 0u32;
                            while !token.wait_timeout(Duration::from_millis(1)) {
                                ticks += 1;
                            }
                            ticks
                        })
                        .unwrap(),
                    );
                }
                if n == 2 { Flow::Exit } else { Flow::Continue }
            }))
            .unwrap();
        // Would never return had the token not been cancelled.
        handle.expect("routine spawned").join().unwrap();
    }
}
