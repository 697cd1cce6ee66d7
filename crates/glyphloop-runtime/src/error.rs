#![forbid(unsafe_code)]

//! Error types for the runtime.
//!
//! Setup failures surface from [`Engine::run`](crate::Engine::run) before the
//! loop starts. Presentation failures end the loop through the normal drain
//! path, so teardown still runs, and are returned afterwards.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while preparing a run.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(
        "requested grid {columns}x{rows} at cell scale {cell_width}x{cell_height} does not fit \
         the terminal ({terminal_columns}x{terminal_rows})"
    )]
    SurfaceTooLarge {
        columns: u16,
        rows: u16,
        cell_width: u16,
        cell_height: u16,
        terminal_columns: u16,
        terminal_rows: u16,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("surface setup failed: {0}")]
    Surface(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors returned by [`Engine::run`](crate::Engine::run).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine has already run")]
    AlreadyRun,
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error("presenting a frame failed: {0}")]
    Present(String),
    #[error("restoring the surface failed: {0}")]
    Restore(String),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Errors from loading an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for SetupError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid(msg) => Self::InvalidConfig(msg),
            other => Self::InvalidConfig(other.to_string()),
        }
    }
}
