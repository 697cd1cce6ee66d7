#![forbid(unsafe_code)]

//! Engine lifecycle state and the shutdown handshake.
//!
//! A [`ShutdownHandle`] is shared between the main loop and anything that may
//! want the loop to end: a signal watcher, another thread, a test. Raising
//! the quit request is a single atomic store and never blocks. A party that
//! must not return until teardown has finished (a termination handler, for
//! instance) follows the request with
//! [`wait_until_stopped`](ShutdownHandle::wait_until_stopped), which blocks on
//! a condition variable until the engine publishes [`EngineState::Stopped`].
//!
//! ```text
//! NotStarted ──run──▶ Running ──quit──▶ Draining ──teardown──▶ Stopped
//! ```
//!
//! Waiters re-check the state after every wakeup, so a notification that
//! arrives before the waiter blocks is never lost.

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use web_time::{Duration, Instant};

/// Where an engine is in its single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EngineState {
    NotStarted,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        })
    }
}

struct Shared {
    quit: AtomicBool,
    state: Mutex<EngineState>,
    stopped: Condvar,
}

/// Cloneable handle onto an engine's quit request and lifecycle state.
#[derive(Clone)]
pub struct ShutdownHandle {
    inner: Arc<Shared>,
}

impl fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownHandle")
            .field("quit", &self.is_shutdown_requested())
            .field("state", &self.state())
            .finish()
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Shared {
                quit: AtomicBool::new(false),
                state: Mutex::new(EngineState::NotStarted),
                stopped: Condvar::new(),
            }),
        }
    }

    /// Ask the loop to exit at its next quit check. Never blocks.
    pub fn request_shutdown(&self) {
        if !self.inner.quit.swap(true, Ordering::AcqRel) {
            tracing::debug!("shutdown requested");
        }
    }

    #[inline]
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.inner.quit.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        *self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Block until the engine reports [`EngineState::Stopped`].
    ///
    /// Returns immediately if it already has.
    pub fn wait_until_stopped(&self) {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        while *state != EngineState::Stopped {
            state = self
                .inner
                .stopped
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Like [`wait_until_stopped`](Self::wait_until_stopped), giving up
    /// after `timeout`. Returns whether the engine stopped.
    pub fn wait_until_stopped_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        while *state != EngineState::Stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .inner
                .stopped
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            state = guard;
        }
        true
    }

    /// Move to `next`, waking waiters when it is [`EngineState::Stopped`].
    pub(crate) fn transition(&self, next: EngineState) {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        tracing::debug!(from = %*state, to = %next, "engine state change");
        *state = next;
        if next == EngineState::Stopped {
            self.inner.stopped.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn starts_not_started_without_request() {
        let handle = ShutdownHandle::new();
        assert_eq!(handle.state(), EngineState::NotStarted);
        assert!(!handle.is_shutdown_requested());
    }

    #[test]
    fn request_is_visible_through_clones() {
        let handle = ShutdownHandle::new();
        let other = handle.clone();
        other.request_shutdown();
        other.request_shutdown();
        assert!(handle.is_shutdown_requested());
    }

    #[test]
    fn wait_returns_at_once_when_already_stopped() {
        let handle = ShutdownHandle::new();
        handle.transition(EngineState::Stopped);
        handle.wait_until_stopped();
        assert!(handle.wait_until_stopped_timeout(Duration::ZERO));
    }

    #[test]
    fn timeout_expires_while_running() {
        let handle = ShutdownHandle::new();
        handle.transition(EngineState::Running);
        assert!(!handle.wait_until_stopped_timeout(Duration::from_millis(20)));
    }

    #[test]
    fn waiter_unblocks_only_after_stop() {
        let handle = ShutdownHandle::new();
        handle.transition(EngineState::Running);
        let (tx, rx) = mpsc::channel();
        let waiter = {
            let handle = handle.clone();
            thread::spawn(move || {
                handle.request_shutdown();
                handle.wait_until_stopped();
                tx.send(handle.state()).unwrap();
            })
        };
        while !handle.is_shutdown_requested() {
            thread::yield_now();
        }
        handle.transition(EngineState::Draining);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        handle.transition(EngineState::Stopped);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            EngineState::Stopped
        );
        waiter.join().unwrap();
    }

    #[test]
    fn states_are_ordered_along_the_lifecycle() {
        assert!(EngineState::NotStarted < EngineState::Running);
        assert!(EngineState::Running < EngineState::Draining);
        assert!(EngineState::Draining < EngineState::Stopped);
        assert_eq!(EngineState::Draining.to_string(), "draining");
    }
}
