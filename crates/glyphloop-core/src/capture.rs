#![forbid(unsafe_code)]

//! Event capture: the background key-listener thread and the shared input
//! buffer it feeds.
//!
//! # Role in glyphloop
//! Polled sampling only sees the key table once per frame, so a tap shorter
//! than a frame can be missed. The capture thread closes that gap: it blocks
//! on a [`KeyHook`], classifies every raw notification, and appends the
//! resulting [`KeyEvent`] to the [`InputBuffer`]. The main loop consumes the
//! buffer once per frame.
//!
//! # Locking discipline
//! One mutex guards the buffer and the last recorded event together.
//! [`InputBuffer::record`] classifies, appends, and updates the last event
//! under a single acquisition, so a concurrent reader never sees an event
//! whose classification disagrees with the buffer order.
//!
//! The main loop holds the same mutex (through [`InputBufferGuard`]) across
//! "read events, run update, clear", which is why events are never lost or
//! seen twice.
//!
//! # Thread lifecycle
//! The thread is named `glyphloop-capture` and is not joined by the engine.
//! [`CaptureHandle::stop`] asks the hook loop to finish at its next bounded
//! wait; hooks are expected to check the [`CaptureStop`] they are given.

use std::fmt;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::event::{KeyDirection, KeyEvent, RawKeyNotification};
use crate::key::KeyCode;
use crate::key_state::KeyState;

/// Thread name used for the capture thread.
pub const CAPTURE_THREAD_NAME: &str = "glyphloop-capture";

#[derive(Debug, Default)]
struct BufferState {
    events: Vec<KeyEvent>,
    last: Option<KeyEvent>,
    recorded: u64,
}

/// Shared buffer of classified key events.
#[derive(Debug, Default)]
pub struct InputBuffer {
    state: Mutex<BufferState>,
}

impl InputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `notification`, append it, and remember it as the last event.
    pub fn record(&self, notification: RawKeyNotification) -> KeyEvent {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let event = KeyEvent::new(notification.code, classify(state.last, notification));
        state.events.push(event);
        state.last = Some(event);
        state.recorded += 1;
        tracing::trace!(code = notification.code.raw(), ?event.state, "key event recorded");
        event
    }

    /// Take the buffer lock for a consume-then-clear step.
    pub fn lock(&self) -> InputBufferGuard<'_> {
        InputBufferGuard {
            state: self.state.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }

    /// Number of events currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().events().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total events recorded since creation, including cleared ones.
    #[must_use]
    pub fn total_recorded(&self) -> u64 {
        self.lock().state.recorded
    }
}

/// Exclusive view of the buffer for the duration of one consume step.
pub struct InputBufferGuard<'a> {
    state: MutexGuard<'a, BufferState>,
}

impl InputBufferGuard<'_> {
    /// Events in arrival order.
    #[must_use]
    pub fn events(&self) -> &[KeyEvent] {
        &self.state.events
    }

    /// Most recently recorded event, surviving clears.
    #[must_use]
    pub fn last_event(&self) -> Option<KeyEvent> {
        self.state.last
    }

    /// Drop all buffered events. The last event is kept for classification.
    pub fn clear(&mut self) {
        self.state.events.clear();
    }
}

impl fmt::Debug for InputBufferGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputBufferGuard")
            .field("events", &self.state.events.len())
            .field("last", &self.state.last)
            .finish()
    }
}

/// Classify a notification given the last recorded event.
///
/// A down notification repeating the code of a last event that was not a
/// release is Held; any other down is Pressed. Up is always Released.
#[must_use]
pub fn classify(last: Option<KeyEvent>, notification: RawKeyNotification) -> KeyState {
    match notification.direction {
        KeyDirection::Up => KeyState::RELEASED,
        KeyDirection::Down => match last {
            Some(prev) if prev.code == notification.code && !prev.state.released => KeyState::HELD,
            _ => KeyState::PRESSED,
        },
    }
}

/// Cooperative stop flag shared between a [`CaptureHandle`] and its hook.
#[derive(Debug, Clone, Default)]
pub struct CaptureStop {
    flag: Arc<AtomicBool>,
}

impl CaptureStop {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// A source of raw key notifications.
pub trait KeyHook: Send + 'static {
    /// Why registration failed.
    type Error: fmt::Display;

    /// Register the listener. Called once on the capture thread.
    fn install(&mut self) -> Result<(), Self::Error>;

    /// Block until the next notification.
    ///
    /// Returns `None` once the source is closed or `stop` has been raised.
    /// Implementations must observe `stop` within a bounded wait.
    fn next_notification(&mut self, stop: &CaptureStop) -> Option<RawKeyNotification>;

    /// Unregister the listener. Called once on the capture thread on exit.
    fn uninstall(&mut self) {}
}

/// Spawner for the capture thread.
#[derive(Debug, Clone, Copy)]
pub struct EventCapture;

impl EventCapture {
    /// Spawn the capture thread for `hook`, feeding `buffer`.
    pub fn spawn<H: KeyHook>(hook: H, buffer: Arc<InputBuffer>) -> io::Result<CaptureHandle> {
        let stop = CaptureStop::new();
        let thread_stop = stop.clone();
        let handle = thread::Builder::new()
            .name(CAPTURE_THREAD_NAME.into())
            .spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    capture_loop(hook, &buffer, &thread_stop);
                }));
                if outcome.is_err() {
                    tracing::warn!("key hook panicked; capture thread exiting");
                }
            })?;
        tracing::debug!(thread = CAPTURE_THREAD_NAME, "event capture started");
        Ok(CaptureHandle {
            stop,
            handle: Some(handle),
        })
    }
}

fn capture_loop<H: KeyHook>(mut hook: H, buffer: &InputBuffer, stop: &CaptureStop) {
    if let Err(err) = hook.install() {
        tracing::warn!(error = %err, "key hook registration failed; continuing on polled input");
        return;
    }
    let mut count: u64 = 0;
    while !stop.is_stopped() {
        match hook.next_notification(stop) {
            Some(notification) => {
                buffer.record(notification);
                count += 1;
            }
            None => break,
        }
    }
    hook.uninstall();
    tracing::debug!(events = count, "event capture finished");
}

/// Handle to a running capture thread.
///
/// Dropping the handle leaves the thread running.
#[derive(Debug)]
pub struct CaptureHandle {
    stop: CaptureStop,
    handle: Option<JoinHandle<()>>,
}

impl CaptureHandle {
    /// Ask the hook loop to finish.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// The stop flag given to the hook.
    #[must_use]
    pub fn stop_signal(&self) -> CaptureStop {
        self.stop.clone()
    }

    /// Whether the thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the thread to exit.
    pub fn join(mut self) -> thread::Result<()> {
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

/// Interval at which [`ChannelKeyHook`] rechecks its stop flag.
const CHANNEL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// In-process key hook fed through a channel.
///
/// Used by the headless backend and by tests to drive the capture thread
/// deterministically.
#[derive(Debug)]
pub struct ChannelKeyHook {
    rx: mpsc::Receiver<RawKeyNotification>,
    install_error: Option<String>,
}

/// Sending half of a [`ChannelKeyHook`].
#[derive(Debug, Clone)]
pub struct ChannelKeySender {
    tx: mpsc::Sender<RawKeyNotification>,
}

impl ChannelKeyHook {
    /// Create a connected hook/sender pair.
    #[must_use]
    pub fn pair() -> (Self, ChannelKeySender) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                rx,
                install_error: None,
            },
            ChannelKeySender { tx },
        )
    }

    /// Make [`install`](KeyHook::install) fail with `message`.
    #[must_use]
    pub fn with_install_error(mut self, message: impl Into<String>) -> Self {
        self.install_error = Some(message.into());
        self
    }
}

impl KeyHook for ChannelKeyHook {
    type Error = String;

    fn install(&mut self) -> Result<(), Self::Error> {
        match self.install_error.take() {
            Some(message) => Err(message),
            None => Ok(()),
        }
    }

    fn next_notification(&mut self, stop: &CaptureStop) -> Option<RawKeyNotification> {
        loop {
            if stop.is_stopped() {
                return None;
            }
            match self.rx.recv_timeout(CHANNEL_POLL_INTERVAL) {
                Ok(notification) => return Some(notification),
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

impl ChannelKeySender {
    /// Send a notification. Returns `false` if the hook is gone.
    pub fn send(&self, notification: RawKeyNotification) -> bool {
        self.tx.send(notification).is_ok()
    }

    pub fn down(&self, code: KeyCode) -> bool {
        self.send(RawKeyNotification::down(code))
    }

    pub fn up(&self, code: KeyCode) -> bool {
        self.send(RawKeyNotification::up(code))
    }
}
