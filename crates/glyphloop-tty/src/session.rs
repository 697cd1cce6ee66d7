#![forbid(unsafe_code)]

//! Terminal mode guard for the engine's drawing surface.
//!
//! [`TerminalSession`] puts the terminal into the state the engine draws in
//! (raw mode, alternate screen, hidden cursor, optional mouse, focus, and
//! key-release reporting) and restores it when dropped, on the normal path
//! and during panic unwinding. A process-wide panic hook performs the same
//! restore for panics that abort before the session's `Drop` runs.
//!
//! Only one session may be active per process.

use std::env;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{cursor, execute, terminal};

/// Set while a session owns the terminal.
static OWNED: AtomicBool = AtomicBool::new(false);

/// Exclusive claim on the terminal, released on drop.
#[derive(Debug)]
struct Claim;

impl Claim {
    fn take() -> io::Result<Self> {
        OWNED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self)
            .map_err(|_| io::Error::other("a terminal session is already open"))
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        OWNED.store(false, Ordering::Release);
    }
}

/// Which terminal modes a session enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Switch to the alternate screen and clear it.
    pub alternate_screen: bool,
    /// Report mouse motion, buttons, and wheel.
    pub mouse_capture: bool,
    /// Report focus gain and loss.
    pub focus_events: bool,
    /// Ask the terminal to report key repeats and releases, when it can.
    pub key_release_events: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            alternate_screen: true,
            mouse_capture: true,
            focus_events: true,
            key_release_events: true,
        }
    }
}

/// A terminal mode the session switched on and must switch off again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Raw,
    KeyReleases,
    AlternateScreen,
    HiddenCursor,
    Mouse,
    Focus,
}

impl Mode {
    /// Every mode, in the order a full restore undoes them.
    const RESTORE_ORDER: [Mode; 6] = [
        Mode::Focus,
        Mode::Mouse,
        Mode::HiddenCursor,
        Mode::AlternateScreen,
        Mode::KeyReleases,
        Mode::Raw,
    ];

    fn enter(self, out: &mut impl Write) -> io::Result<()> {
        match self {
            Mode::Raw => terminal::enable_raw_mode(),
            Mode::KeyReleases => execute!(
                out,
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                )
            ),
            Mode::AlternateScreen => execute!(
                out,
                terminal::EnterAlternateScreen,
                terminal::Clear(terminal::ClearType::All),
                cursor::MoveTo(0, 0)
            ),
            Mode::HiddenCursor => execute!(out, cursor::Hide),
            Mode::Mouse => execute!(out, EnableMouseCapture),
            Mode::Focus => execute!(out, EnableFocusChange),
        }
    }

    fn leave(self, out: &mut impl Write) -> io::Result<()> {
        match self {
            Mode::Raw => terminal::disable_raw_mode(),
            Mode::KeyReleases => execute!(out, PopKeyboardEnhancementFlags),
            Mode::AlternateScreen => execute!(out, terminal::LeaveAlternateScreen),
            Mode::HiddenCursor => execute!(out, cursor::Show),
            Mode::Mouse => execute!(out, DisableMouseCapture),
            Mode::Focus => execute!(out, DisableFocusChange),
        }
    }
}

/// RAII guard over terminal modes.
#[derive(Debug)]
pub struct TerminalSession {
    claim: Option<Claim>,
    options: SessionOptions,
    /// Modes switched on, in order.
    entered: Vec<Mode>,
}

impl TerminalSession {
    /// Enter raw mode and enable the requested modes.
    ///
    /// # Errors
    ///
    /// Fails if another session is open or a mode cannot be enabled. Modes
    /// enabled before a failure are restored.
    pub fn new(options: SessionOptions) -> io::Result<Self> {
        install_panic_hook();
        let mut session = Self {
            claim: Some(Claim::take()?),
            options,
            entered: Vec::with_capacity(Mode::RESTORE_ORDER.len()),
        };

        let releases = options.key_release_events
            && terminal::supports_keyboard_enhancement().unwrap_or(false);
        let wanted = [
            (Mode::Raw, true),
            (Mode::KeyReleases, releases),
            (Mode::AlternateScreen, options.alternate_screen),
            (Mode::HiddenCursor, true),
            (Mode::Mouse, options.mouse_capture),
            (Mode::Focus, options.focus_events),
        ];
        let mut out = io::stdout();
        for mode in wanted.into_iter().filter_map(|(mode, on)| on.then_some(mode)) {
            // On error `session` drops and undoes what was entered so far.
            mode.enter(&mut out)?;
            session.entered.push(mode);
            tracing::debug!(?mode, "terminal mode entered");
        }
        tracing::info!(modes = session.entered.len(), "terminal session opened");
        Ok(session)
    }

    /// Current terminal size (columns, rows).
    pub fn size(&self) -> io::Result<(u16, u16)> {
        terminal_size()
    }

    /// Whether the terminal reports key releases for this session.
    #[must_use]
    pub fn reports_key_releases(&self) -> bool {
        self.entered.contains(&Mode::KeyReleases)
    }

    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let mut out = io::stdout();
        while let Some(mode) = self.entered.pop() {
            if let Err(err) = mode.leave(&mut out) {
                tracing::warn!(?mode, error = %err, "failed to restore terminal mode");
            }
        }
        let _ = out.flush();
        // Release the claim only after every mode is restored.
        self.claim.take();
        tracing::info!("terminal session closed");
    }
}

/// Terminal size, falling back to `COLUMNS`/`LINES` when the query fails
/// or reports a degenerate size.
pub fn terminal_size() -> io::Result<(u16, u16)> {
    let usable = |(w, h): (u16, u16)| (w > 1 && h > 1).then_some((w, h));
    match terminal::size() {
        Ok(size) => usable(size)
            .or_else(|| env_size().and_then(usable))
            .ok_or_else(|| io::Error::other("terminal reported a zero size")),
        Err(err) => env_size().and_then(usable).ok_or(err),
    }
}

fn env_size() -> Option<(u16, u16)> {
    let read = |name: &str| env::var(name).ok()?.trim().parse::<u16>().ok();
    Some((read("COLUMNS")?, read("LINES")?))
}

fn install_panic_hook() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        let chained = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup_for_exit();
            chained(info);
        }));
    });
}

/// Best-effort restore for exit paths that skip `Drop`.
///
/// Does nothing when no session is open.
pub fn best_effort_cleanup_for_exit() {
    if !OWNED.load(Ordering::Acquire) {
        return;
    }
    let mut out = io::stdout();
    for mode in Mode::RESTORE_ORDER {
        let _ = mode.leave(&mut out);
    }
    let _ = out.flush();
}
