#![forbid(unsafe_code)]

//! Countdown timer driven by the frame clock.
//!
//! A [`Timer`] holds no clock of its own. It is started with a deadline
//! relative to a timestamp, usually [`Context::elapsed`](crate::Context::elapsed),
//! and queried against later timestamps from the same source.

use web_time::Duration;

/// A one-shot countdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Duration>,
}

impl Timer {
    /// A stopped timer.
    #[must_use]
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Arm the timer to fire `length` after `now`. Restarts a running timer.
    pub fn start(&mut self, now: Duration, length: Duration) {
        self.deadline = Some(now.saturating_add(length));
    }

    /// Disarm the timer.
    pub fn stop(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left at `now`; zero once expired or when stopped.
    #[must_use]
    pub fn remaining(&self, now: Duration) -> Duration {
        self.deadline
            .map_or(Duration::ZERO, |deadline| deadline.saturating_sub(now))
    }

    /// Whether a running timer has reached its deadline at `now`.
    #[must_use]
    pub fn ready(&self, now: Duration) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}
