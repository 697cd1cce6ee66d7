#![forbid(unsafe_code)]
#![doc = "Native terminal backend for glyphloop."]
#![doc = ""]
#![doc = "This crate implements the `glyphloop-backend` traits for terminals driven"]
#![doc = "through crossterm: a [`TerminalSession`] guard for raw mode and the alternate"]
#![doc = "screen, a [`TtyKeyHook`] for the capture thread, polled input over a shared"]
#![doc = "raw key table, and a diffing [`TtyPresenter`]."]
#![doc = ""]
#![doc = "## Input paths"]
#![doc = ""]
#![doc = "The terminal has one input stream. When the runtime takes the key hook, the"]
#![doc = "capture thread becomes its only reader and feeds both the event buffer and"]
#![doc = "the raw key table polled each frame. When the hook is never taken, fails to"]
#![doc = "install, or exits, polled sampling reads the stream itself, without blocking."]

pub mod hook;
pub mod keymap;
pub mod presenter;
pub mod session;

use core::time::Duration;
use std::io::{self, Stdout};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use crossterm::event;
use glyphloop_backend::{Backend, BackendClock, BackendPresenter, BackendSurface, SurfaceRequest};
use glyphloop_core::{InputSource, KEY_COUNT, PlatformEvent};
use web_time::Instant;

pub use hook::{HOOK_POLL_INTERVAL, SharedKeyTable, SharedTranslator, Translator, TtyKeyHook};
pub use presenter::TtyPresenter;
pub use session::{SessionOptions, TerminalSession, best_effort_cleanup_for_exit};

/// Upper bound on terminal events read per frame by polled sampling.
const FALLBACK_READ_LIMIT: usize = 256;

// ── Clock ────────────────────────────────────────────────────────────────

/// Monotonic clock backed by `web_time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct TtyClock {
    epoch: Instant,
}

impl TtyClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for TtyClock {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendClock for TtyClock {
    fn now_mono(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// ── Polled input ─────────────────────────────────────────────────────────

/// Polled half of terminal input.
#[derive(Debug)]
pub struct TtyInput {
    keys: SharedKeyTable,
    events: mpsc::Receiver<PlatformEvent>,
    /// Empty while a key hook is reading.
    reader: SharedTranslator,
    scratch: Vec<glyphloop_core::RawKeyNotification>,
}

impl TtyInput {
    fn new() -> Self {
        let keys: SharedKeyTable = Arc::new(Mutex::new([false; KEY_COUNT]));
        let (tx, rx) = mpsc::channel();
        Self {
            reader: Arc::new(Mutex::new(Some(Translator::new(Arc::clone(&keys), tx)))),
            keys,
            events: rx,
            scratch: Vec::new(),
        }
    }

    fn read_pending(&mut self) {
        let mut reader = self.reader.lock().unwrap_or_else(|e| e.into_inner());
        let Some(translator) = reader.as_mut() else {
            return;
        };
        for _ in 0..FALLBACK_READ_LIMIT {
            match event::poll(Duration::ZERO) {
                Ok(true) => match event::read() {
                    Ok(ev) => translator.translate(ev, Instant::now(), &mut self.scratch),
                    Err(err) => {
                        tracing::warn!(error = %err, "terminal read failed");
                        break;
                    }
                },
                Ok(false) => break,
                Err(err) => {
                    tracing::warn!(error = %err, "terminal poll failed");
                    break;
                }
            }
        }
        translator.expire(Instant::now(), &mut self.scratch);
        // No capture thread to hand notifications to.
        self.scratch.clear();
    }
}

impl InputSource for TtyInput {
    fn sample_keys(&mut self, out: &mut [bool; KEY_COUNT]) {
        self.read_pending();
        *out = *self.keys.lock().unwrap_or_else(|e| e.into_inner());
    }

    fn poll_platform_event(&mut self) -> Option<PlatformEvent> {
        self.events.try_recv().ok()
    }
}

// ── Backend ──────────────────────────────────────────────────────────────

/// Native terminal backend.
pub struct TtyBackend {
    clock: TtyClock,
    input: TtyInput,
    presenter: TtyPresenter<Stdout>,
    session: Option<TerminalSession>,
    options: SessionOptions,
}

impl TtyBackend {
    /// Backend writing to stdout with default session options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(SessionOptions::default())
    }

    #[must_use]
    pub fn with_options(options: SessionOptions) -> Self {
        Self {
            clock: TtyClock::new(),
            input: TtyInput::new(),
            presenter: TtyPresenter::new(io::stdout()),
            session: None,
            options,
        }
    }

    /// Whether the surface is currently open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for TtyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendSurface for TtyBackend {
    type Error = io::Error;

    fn terminal_size(&self) -> io::Result<(u16, u16)> {
        session::terminal_size()
    }

    fn open(&mut self, request: &SurfaceRequest) -> io::Result<()> {
        if self.session.is_some() {
            return Err(io::Error::other("terminal surface already open"));
        }
        let options = SessionOptions {
            mouse_capture: self.options.mouse_capture && request.capture_mouse,
            ..self.options
        };
        let session = TerminalSession::new(options)?;
        let reports_releases = session.reports_key_releases();
        if let Some(translator) = self
            .input
            .reader
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_mut()
        {
            translator.configure(request.scale, request.key_release_timeout, reports_releases);
        }
        self.presenter.set_scale(request.scale);
        self.session = Some(session);
        self.presenter.set_title(&request.title)?;
        tracing::info!(
            title = %request.title,
            scale_w = request.scale.width,
            scale_h = request.scale.height,
            reports_releases,
            "terminal surface opened"
        );
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(session) = self.session.take() {
            drop(session);
            self.presenter.invalidate();
            tracing::info!("terminal surface closed");
        }
        Ok(())
    }
}

impl Backend for TtyBackend {
    type Clock = TtyClock;
    type Input = TtyInput;
    type Presenter = TtyPresenter<Stdout>;
    type Hook = TtyKeyHook;

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
        TtyKeyHook::take(&self.input.reader)
    }
}

impl Drop for TtyBackend {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
