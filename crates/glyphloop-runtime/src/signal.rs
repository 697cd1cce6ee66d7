#![forbid(unsafe_code)]

//! Termination-signal watcher.
//!
//! On Unix, [`TerminationWatcher`] listens for `SIGINT`, `SIGTERM`, and
//! `SIGHUP` on a dedicated thread. The first signal raises the engine's quit
//! request and then blocks that thread until the engine reports it has
//! stopped, so the process is never torn down underneath a half-restored
//! terminal. Later signals are ignored while the drain is in progress.
//!
//! On other platforms the watcher is inert.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crate::lifecycle::ShutdownHandle;

/// Thread name used for the watcher thread.
pub const SIGNAL_THREAD_NAME: &str = "glyphloop-signal";

#[cfg(unix)]
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

/// Routes termination signals into a [`ShutdownHandle`].
///
/// Dropping the watcher stops listening and joins its thread, unless that
/// thread is still waiting on an engine that has not stopped.
#[derive(Debug)]
pub struct TerminationWatcher {
    #[cfg(unix)]
    handle: signal_hook::iterator::Handle,
    fired: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TerminationWatcher {
    /// Start watching on behalf of `shutdown`.
    #[cfg(unix)]
    pub fn install(shutdown: ShutdownHandle) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
        let handle = signals.handle();
        let fired = Arc::new(AtomicBool::new(false));
        let thread_fired = Arc::clone(&fired);
        let thread = std::thread::Builder::new()
            .name(SIGNAL_THREAD_NAME.into())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    thread_fired.store(true, Ordering::Release);
                    tracing::warn!(signal, "termination signal received; draining engine");
                    shutdown.request_shutdown();
                    shutdown.wait_until_stopped();
                    tracing::info!(signal, "engine stopped after termination signal");
                }
            })?;
        tracing::debug!(thread = SIGNAL_THREAD_NAME, "termination watcher installed");
        Ok(Self {
            handle,
            fired,
            thread: Some(thread),
        })
    }

    #[cfg(not(unix))]
    pub fn install(_shutdown: ShutdownHandle) -> io::Result<Self> {
        tracing::debug!("termination signals are not watched on this platform");
        Ok(Self {
            fired: Arc::new(AtomicBool::new(false)),
            thread: None,
        })
    }

    /// Whether a termination signal has been received.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Whether the watcher thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for TerminationWatcher {
    fn drop(&mut self) {
        #[cfg(unix)]
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            if self.has_fired() && !thread.is_finished() {
                tracing::warn!("termination watcher dropped before the engine stopped");
                return;
            }
            let _ = thread.join();
        }
    }
}
