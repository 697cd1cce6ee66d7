#![forbid(unsafe_code)]

//! Frame pacing and the rolling FPS average.
//!
//! The [`FrameScheduler`] is pure bookkeeping over timestamps handed in by
//! the caller. The engine reads the time from its
//! [`BackendClock`](glyphloop_backend::BackendClock), asks the scheduler how
//! long to sleep, and performs the sleep itself, so every rule here can be
//! exercised with synthetic timestamps.
//!
//! # Pacing
//!
//! When the rate is [`FrameRate::Limited`], each call to
//! [`pace`](FrameScheduler::pace) advances a deadline by one interval and
//! returns the time left until it. A frame that overruns its deadline resets
//! the deadline base to the current time: late frames are not made up with a
//! burst of unpaced ones.
//!
//! # Averaging
//!
//! Deltas go into a ring of [`FPS_WINDOW`] slots that starts zeroed, so the
//! first few readings are skewed low until the window has filled.

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of deltas averaged for the FPS reading.
pub const FPS_WINDOW: usize = 10;

/// Frame rate used when none is configured.
pub const DEFAULT_FPS: f64 = 60.0;

/// Target update cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameRate {
    /// At most this many iterations per second.
    Limited(f64),
    /// Run as fast as the loop allows.
    Unlimited,
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::Limited(DEFAULT_FPS)
    }
}

impl FrameRate {
    /// Whether the rate can drive a scheduler: unlimited, or a finite
    /// positive FPS whose frame length fits in a [`Duration`].
    #[must_use]
    pub fn is_valid(self) -> bool {
        match self {
            Self::Limited(fps) => limited_interval(fps).is_some(),
            Self::Unlimited => true,
        }
    }

    /// Length of one frame, `None` when unlimited or invalid.
    #[must_use]
    pub fn interval(self) -> Option<Duration> {
        match self {
            Self::Limited(fps) => limited_interval(fps),
            Self::Unlimited => None,
        }
    }

    #[must_use]
    pub fn is_limited(self) -> bool {
        matches!(self, Self::Limited(_))
    }
}

fn limited_interval(fps: f64) -> Option<Duration> {
    if !(fps.is_finite() && fps > 0.0) {
        return None;
    }
    Duration::try_from_secs_f64(fps.recip()).ok()
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(fps) => write!(f, "{fps} fps"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

// In TOML a rate is either a number or the string "unlimited".
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FrameRateRepr {
    Fps(f64),
    Word(String),
}

impl Serialize for FrameRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::Limited(fps) => FrameRateRepr::Fps(fps),
            Self::Unlimited => FrameRateRepr::Word("unlimited".to_owned()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FrameRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match FrameRateRepr::deserialize(deserializer)? {
            FrameRateRepr::Fps(fps) => Ok(Self::Limited(fps)),
            FrameRateRepr::Word(word) if word.eq_ignore_ascii_case("unlimited") => {
                Ok(Self::Unlimited)
            }
            FrameRateRepr::Word(other) => Err(serde::de::Error::custom(format!(
                "unknown frame rate: {other} (expected a number or \"unlimited\")"
            ))),
        }
    }
}

/// Snapshot of the scheduler's timing state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    /// Seconds since the previous iteration began.
    pub delta_seconds: f64,
    /// The most recent deltas, oldest first.
    pub window: [f64; FPS_WINDOW],
    pub average_fps: f64,
}

/// Per-iteration delta, pacing deadline, and rolling FPS average.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    rate: FrameRate,
    interval: Option<Duration>,
    window: [f64; FPS_WINDOW],
    cursor: usize,
    previous_start: Option<Duration>,
    deadline: Option<Duration>,
    delta: f64,
    average_fps: f64,
    iterations: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(FrameRate::default())
    }
}

impl FrameScheduler {
    /// A scheduler at `rate`. An invalid rate falls back to the default.
    #[must_use]
    pub fn new(rate: FrameRate) -> Self {
        let rate = if rate.is_valid() {
            rate
        } else {
            FrameRate::default()
        };
        Self {
            rate,
            interval: rate.interval(),
            window: [0.0; FPS_WINDOW],
            cursor: 0,
            previous_start: None,
            deadline: None,
            delta: 0.0,
            average_fps: 0.0,
            iterations: 0,
        }
    }

    /// Anchor the first delta and the first deadline at `now`.
    pub fn start(&mut self, now: Duration) {
        self.previous_start = Some(now);
        self.deadline = Some(now);
    }

    /// Record the start of an iteration and return its delta in seconds.
    ///
    /// Without a prior [`start`](Self::start) the first delta is zero.
    pub fn begin_iteration(&mut self, now: Duration) -> f64 {
        let delta = self
            .previous_start
            .map_or(0.0, |prev| now.saturating_sub(prev).as_secs_f64());
        self.previous_start = Some(now);
        self.delta = delta;

        self.window[self.cursor] = delta;
        self.cursor = (self.cursor + 1) % FPS_WINDOW;
        let mean = self.window.iter().sum::<f64>() / FPS_WINDOW as f64;
        self.average_fps = if mean > 0.0 { 1.0 / mean } else { 0.0 };

        self.iterations += 1;
        delta
    }

    /// How long to sleep before the next iteration.
    ///
    /// `None` when unlimited, or when the deadline has already passed; in the
    /// latter case the deadline base moves to `now`.
    pub fn pace(&mut self, now: Duration) -> Option<Duration> {
        let interval = self.interval?;
        let deadline = self
            .deadline
            .unwrap_or(now)
            .checked_add(interval)
            .unwrap_or(Duration::MAX);
        if deadline > now {
            self.deadline = Some(deadline);
            Some(deadline - now)
        } else {
            tracing::trace!(
                overrun_us = (now - deadline).as_micros() as u64,
                "frame overran its deadline"
            );
            self.deadline = Some(now);
            None
        }
    }

    /// Change the target rate. Returns `false`, leaving the rate unchanged,
    /// when `rate` is not valid.
    pub fn set_rate(&mut self, rate: FrameRate) -> bool {
        if !rate.is_valid() {
            return false;
        }
        if rate != self.rate {
            self.rate = rate;
            self.interval = rate.interval();
            self.deadline = None;
        }
        true
    }

    #[must_use]
    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    /// Delta of the latest iteration, in seconds.
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    #[must_use]
    pub fn average_fps(&self) -> f64 {
        self.average_fps
    }

    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    #[must_use]
    pub fn timing(&self) -> FrameTiming {
        let mut window = [0.0; FPS_WINDOW];
        for (i, slot) in window.iter_mut().enumerate() {
            *slot = self.window[(self.cursor + i) % FPS_WINDOW];
        }
        FrameTiming {
            delta_seconds: self.delta,
            window,
            average_fps: self.average_fps,
        }
    }
}
