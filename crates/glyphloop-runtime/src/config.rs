#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! [`EngineConfig`] can be built in code or loaded from TOML. Every field
//! has a default, so a file only needs the keys it changes:
//!
//! ```toml
//! title = "snake"
//! frame_rate = 30
//! cell_width = 2
//!
//! [screen]
//! mode = "windowed"
//! width = 40
//! height = 20
//! ```
//!
//! `frame_rate` is a number or `"unlimited"`; `[screen]` takes
//! `mode = "fullscreen"` to size the grid from the terminal instead.

use std::path::Path;

use glyphloop_backend::{CellScale, SurfaceRequest};
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::error::ConfigError;
use crate::scheduler::FrameRate;

/// How the grid is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScreenMode {
    /// A fixed grid of `width x height` cells.
    Windowed { width: u16, height: u16 },
    /// Fill the terminal; the grid follows terminal resizes.
    Fullscreen,
}

impl Default for ScreenMode {
    fn default() -> Self {
        Self::Windowed {
            width: 80,
            height: 24,
        }
    }
}

/// Everything an [`Engine`](crate::Engine) needs before it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Window title. The FPS reading is appended while pacing is on.
    pub title: String,
    pub screen: ScreenMode,
    /// Terminal columns per grid cell.
    pub cell_width: u16,
    /// Terminal rows per grid cell.
    pub cell_height: u16,
    pub frame_rate: FrameRate,
    /// Run the event-driven key capture thread.
    pub capture_keys: bool,
    /// Report mouse input.
    pub capture_mouse: bool,
    /// For terminals that never report key releases: how long after the last
    /// key notification the key counts as released.
    ///
    /// Shorter than the keyboard's autorepeat delay, a held key flickers
    /// pressed, released, pressed around its first repeat. Longer, releases
    /// are reported that much later. The default sits above common
    /// autorepeat delays of 250 to 660 ms.
    pub key_release_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "glyphloop".to_owned(),
            screen: ScreenMode::default(),
            cell_width: 1,
            cell_height: 1,
            frame_rate: FrameRate::default(),
            capture_keys: true,
            capture_mouse: true,
            key_release_timeout_ms: 700,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    /// Check every field, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();
        if let ScreenMode::Windowed { width, height } = self.screen
            && (width == 0 || height == 0)
        {
            problems.push(format!("grid size must be non-zero, got {width}x{height}"));
        }
        if self.cell_width == 0 || self.cell_height == 0 {
            problems.push(format!(
                "cell scale must be non-zero, got {}x{}",
                self.cell_width, self.cell_height
            ));
        }
        if !self.frame_rate.is_valid() {
            problems.push(format!(
                "frame_rate must be a positive number or \"unlimited\", got {}",
                self.frame_rate
            ));
        }
        if self.key_release_timeout_ms == 0 {
            problems.push("key_release_timeout_ms must be non-zero".to_owned());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Fixed grid size in cells.
    #[must_use]
    pub fn windowed(mut self, width: u16, height: u16) -> Self {
        self.screen = ScreenMode::Windowed { width, height };
        self
    }

    #[must_use]
    pub fn fullscreen(mut self) -> Self {
        self.screen = ScreenMode::Fullscreen;
        self
    }

    /// Terminal cells per grid cell.
    #[must_use]
    pub fn cell_size(mut self, width: u16, height: u16) -> Self {
        self.cell_width = width;
        self.cell_height = height;
        self
    }

    #[must_use]
    pub fn frame_rate(mut self, rate: FrameRate) -> Self {
        self.frame_rate = rate;
        self
    }

    #[must_use]
    pub fn capture_keys(mut self, enabled: bool) -> Self {
        self.capture_keys = enabled;
        self
    }

    #[must_use]
    pub fn capture_mouse(mut self, enabled: bool) -> Self {
        self.capture_mouse = enabled;
        self
    }

    #[must_use]
    pub fn key_release_timeout(mut self, timeout: Duration) -> Self {
        self.key_release_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn scale(&self) -> CellScale {
        CellScale::new(self.cell_width, self.cell_height)
    }

    /// The surface request a backend receives when the engine opens it.
    #[must_use]
    pub fn surface_request(&self) -> SurfaceRequest {
        SurfaceRequest {
            title: self.title.clone(),
            scale: self.scale(),
            capture_mouse: self.capture_mouse,
            key_release_timeout: Duration::from_millis(self.key_release_timeout_ms),
        }
    }
}
