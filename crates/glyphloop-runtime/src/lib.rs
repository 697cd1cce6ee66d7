#![forbid(unsafe_code)]

//! glyphloop Runtime
//!
//! This crate ties the input layer, the grid, and a backend together into a
//! paced frame loop.
//!
//! # Key Components
//!
//! - [`Engine`] - Owns the backend and grid, runs a [`Game`]
//! - [`Context`] - What callbacks read input from and draw into
//! - [`FrameScheduler`] - Frame deltas, pacing, and the rolling FPS average
//! - [`ShutdownHandle`] - Cross-thread quit request and stop handshake
//! - [`TerminationWatcher`] - Routes termination signals into a shutdown
//! - [`EngineConfig`] - Settings, loadable from TOML
//! - [`Timer`] - Countdown over the engine clock
//! - [`RoutineToken`] - Cancellation for background routines
//! - [`HeadlessBackend`] - Terminal-free backend for tests
//!
//! # Role in glyphloop
//! `glyphloop-runtime` is the orchestrator. It starts the capture thread
//! from `glyphloop-core`, samples polled input each frame, drives your
//! `Game::update`, and hands the finished grid to the backend's presenter.
//!
//! # How it fits in the system
//! The runtime sits between input (`glyphloop-core`) and output
//! (`glyphloop-render` plus a backend). It is generic over
//! [`Backend`](glyphloop_backend::Backend), so the same loop runs on a real
//! terminal through `glyphloop-tty` and in memory through [`HeadlessBackend`].

pub mod config;
pub mod engine;
pub mod error;
pub mod headless;
pub mod lifecycle;
pub mod routine;
pub mod scheduler;
pub mod signal;
pub mod timer;

pub use config::{EngineConfig, ScreenMode};
pub use engine::{Context, Engine, Flow, Game};
pub use error::{ConfigError, EngineError, Result, SetupError};
pub use headless::{
    HeadlessBackend, HeadlessClock, HeadlessController, HeadlessInput, HeadlessPresenter,
    ManualClock,
};
pub use lifecycle::{EngineState, ShutdownHandle};
pub use routine::RoutineToken;
pub use scheduler::{DEFAULT_FPS, FPS_WINDOW, FrameRate, FrameScheduler, FrameTiming};
pub use signal::TerminationWatcher;
pub use timer::Timer;
