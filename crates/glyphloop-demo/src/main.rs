#![forbid(unsafe_code)]

//! glyphloop demo
//!
//! A small scene exercising polled key states, captured key events, mouse
//! input, frame pacing, and the FPS title.
//!
//! # Running
//!
//! ```sh
//! cargo run -p glyphloop-demo -- --width 60 --height 20 --fps 30
//! GLYPHLOOP_LOG=debug cargo run -p glyphloop-demo -- --log-file demo.log
//! ```
//!
//! # Controls
//!
//! - Arrows / WASD: move
//! - Left click: paint, right click: erase, wheel: change brush
//! - Space: toggle the frame-rate cap
//! - Esc / Ctrl+C: quit

mod scene;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use glyphloop::{Engine, EngineConfig, FrameRate, TerminationWatcher, TtyBackend};
use tracing_subscriber::EnvFilter;

use crate::scene::Scene;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "GLYPHLOOP_LOG";

#[derive(Debug, Parser)]
#[command(name = "glyphloop-demo", about = "Interactive glyphloop demo", version)]
struct Cli {
    /// TOML engine config; flags given on the command line override it.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Grid width in cells.
    #[arg(long)]
    width: Option<u16>,

    /// Grid height in cells.
    #[arg(long)]
    height: Option<u16>,

    /// Fill the terminal and follow resizes.
    #[arg(long, conflicts_with_all = ["width", "height"])]
    fullscreen: bool,

    /// Target frames per second.
    #[arg(long, conflicts_with = "unlimited")]
    fps: Option<f64>,

    /// Run as fast as possible.
    #[arg(long)]
    unlimited: bool,

    #[arg(long)]
    title: Option<String>,

    /// Write logs here; the terminal itself is the game surface.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn engine_config(&self) -> Result<EngineConfig, String> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_toml_file(path).map_err(|err| err.to_string())?,
            None => EngineConfig::default().title("glyphloop demo").windowed(64, 22),
        };
        if let Some(title) = &self.title {
            config = config.title(title.clone());
        }
        if self.fullscreen {
            config = config.fullscreen();
        } else if self.width.is_some() || self.height.is_some() {
            let (width, height) = match config.screen {
                glyphloop::ScreenMode::Windowed { width, height } => (width, height),
                glyphloop::ScreenMode::Fullscreen => (64, 22),
            };
            config = config.windowed(self.width.unwrap_or(width), self.height.unwrap_or(height));
        }
        if self.unlimited {
            config = config.frame_rate(FrameRate::Unlimited);
        } else if let Some(fps) = self.fps {
            config = config.frame_rate(FrameRate::Limited(fps));
        }
        config.validate().map_err(|err| err.to_string())?;
        Ok(config)
    }
}

fn init_logging(path: &Path) -> std::io::Result<()> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .try_init()
        .is_err()
    {
        eprintln!("a global tracing subscriber is already installed");
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Some(path) = &cli.log_file
        && let Err(err) = init_logging(path)
    {
        eprintln!("cannot open log file {}: {err}", path.display());
        return ExitCode::FAILURE;
    }

    let config = match cli.engine_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    let mut engine = Engine::new(TtyBackend::new(), config);
    let _watcher = match TerminationWatcher::install(engine.shutdown_handle()) {
        Ok(watcher) => Some(watcher),
        Err(err) => {
            tracing::warn!(error = %err, "termination signals will not stop the engine cleanly");
            None
        }
    };

    let mut scene = Scene::new();
    match engine.run(&mut scene) {
        Ok(()) => {
            tracing::info!(frames = scene.frames(), "demo finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("glyphloop-demo: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphloop::ScreenMode;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("glyphloop-demo").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_give_a_windowed_demo() {
        let config = parse(&[]).engine_config().unwrap();
        assert_eq!(config.screen, ScreenMode::Windowed { width: 64, height: 22 });
        assert_eq!(config.title, "glyphloop demo");
    }

    #[test]
    fn flags_override_size_and_rate() {
        let config = parse(&["--width", "30", "--fps", "24"]).engine_config().unwrap();
        assert_eq!(config.screen, ScreenMode::Windowed { width: 30, height: 22 });
        assert_eq!(config.frame_rate, FrameRate::Limited(24.0));

        let config = parse(&["--fullscreen", "--unlimited"]).engine_config().unwrap();
        assert_eq!(config.screen, ScreenMode::Fullscreen);
        assert_eq!(config.frame_rate, FrameRate::Unlimited);
    }

    #[test]
    fn conflicting_flags_are_rejected() {
        let args = ["glyphloop-demo", "--fps", "30", "--unlimited"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn invalid_rate_fails_validation() {
        let err = parse(&["--fps", "0"]).engine_config().unwrap_err();
        assert!(err.contains("frame_rate"), "{err}");
    }
}
