#![forbid(unsafe_code)]

//! Background routines.
//!
//! [`Context::spawn_routine`](crate::Context::spawn_routine) runs a closure
//! on its own named thread, for work that should not hold up a frame. Every
//! routine of a run receives a [`RoutineToken`]; the engine cancels them all
//! once `destroy` has returned. Routines are not joined: keep the returned
//! `JoinHandle` to wait for one.
//!
//! ```no_run
//! # use glyphloop_runtime::Context;
//! # use web_time::Duration;
//! # fn demo(ctx: &Context<'_>) -> std::io::Result<()> {
//! ctx.spawn_routine(|token| {
//!     while !token.wait_timeout(Duration::from_millis(250)) {
//!         // periodic work
//!     }
//! })?;
//! # Ok(())
//! # }
//! ```

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use web_time::{Duration, Instant};

const ROUTINE_THREAD_PREFIX: &str = "glyphloop-routine";

#[derive(Debug, Default)]
struct Cancel {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// Cancellation signal handed to a routine.
#[derive(Debug, Clone)]
pub struct RoutineToken {
    inner: Arc<Cancel>,
}

impl RoutineToken {
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Sleep for `duration`, waking early on cancellation.
    ///
    /// Returns `true` if cancelled, `false` once the full duration elapsed.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let start = Instant::now();
        let mut guard = self.inner.lock.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if self.is_cancelled() {
                return true;
            }
            let Some(remaining) = duration.checked_sub(start.elapsed()) else {
                return false;
            };
            if remaining.is_zero() {
                return false;
            }
            guard = self
                .inner
                .wake
                .wait_timeout(guard, remaining)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
    }
}

/// Routines spawned during one engine run.
#[derive(Debug, Default)]
pub(crate) struct Routines {
    cancel: Arc<Cancel>,
    spawned: AtomicU64,
}

impl Routines {
    pub(crate) fn spawn<F, T>(&self, routine: F) -> io::Result<JoinHandle<T>>
    where
        F: FnOnce(RoutineToken) -> T + Send + 'static,
        T: Send + 'static,
    {
        let id = self.spawned.fetch_add(1, Ordering::Relaxed);
        let token = RoutineToken {
            inner: Arc::clone(&self.cancel),
        };
        let handle = thread::Builder::new()
            .name(format!("{ROUTINE_THREAD_PREFIX}-{id}"))
            .spawn(move || routine(token))?;
        tracing::debug!(id, "routine spawned");
        Ok(handle)
    }

    /// Cancel every routine, present and future.
    pub(crate) fn cancel(&self) {
        self.cancel.cancelled.store(true, Ordering::Release);
        let _guard = self.cancel.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.cancel.wake.notify_all();
        let spawned = self.spawned.load(Ordering::Relaxed);
        if spawned > 0 {
            tracing::debug!(spawned, "routines cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_runs_its_course_without_cancel() {
        let routines = Routines::default();
        let handle = routines
            .spawn(|token| token.wait_timeout(Duration::from_millis(5)))
            .unwrap();
        assert!(!handle.join().unwrap());
    }

    #[test]
    fn cancel_wakes_a_waiting_routine() {
        let routines = Routines::default();
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = routines
            .spawn(move |token| {
                tx.send(()).unwrap();
                let start = Instant::now();
                let cancelled = token.wait_timeout(Duration::from_secs(30));
                (cancelled, start.elapsed())
            })
            .unwrap();
        rx.recv().unwrap();
        routines.cancel();
        let (cancelled, waited) = handle.join().unwrap();
        assert!(cancelled);
        assert!(waited < Duration::from_secs(30));
    }

    #[test]
    fn routines_spawned_after_cancel_see_it() {
        let routines = Routines::default();
        routines.cancel();
        let handle = routines.spawn(|token| token.is_cancelled()).unwrap();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn threads_are_named() {
        let routines = Routines::default();
        let first = routines
            .spawn(|_| thread::current().name().map(str::to_owned))
            .unwrap();
        let second = routines
            .spawn(|_| thread::current().name().map(str::to_owned))
            .unwrap();
        assert_eq!(first.join().unwrap().as_deref(), Some("glyphloop-routine-0"));
        assert_eq!(second.join().unwrap().as_deref(), Some("glyphloop-routine-1"));
    }
}
