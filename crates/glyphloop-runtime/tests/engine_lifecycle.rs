#![forbid(unsafe_code)]

//! Shutdown handshake between an external thread and a running engine.
//!
//! A thread that requests shutdown and then waits must not return before
//! `destroy` has run and the surface has been restored, and `destroy` must
//! run exactly once however many parties ask the engine to stop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::Duration;

use glyphloop_runtime::{
    Context, Engine, EngineConfig, EngineState, Flow, FrameRate, Game, HeadlessBackend,
    ShutdownHandle,
};

#[derive(Default)]
struct Witness {
    running: AtomicBool,
    destroys: AtomicU32,
    destroy_finished: AtomicBool,
}

struct Spinner {
    witness: Arc<Witness>,
}

impl Game for Spinner {
    fn init(&mut self, _ctx: &mut Context<'_>) {}

    fn update(&mut self, _ctx: &mut Context<'_>, _dt: f64) -> Flow {
        self.witness.running.store(true, Ordering::SeqCst);
        Flow::Continue
    }

    fn destroy(&mut self, _ctx: &mut Context<'_>) {
        self.witness.destroys.fetch_add(1, Ordering::SeqCst);
        // Give a premature waiter time to observe the unfinished teardown.
        thread::sleep(Duration::from_millis(50));
        self.witness.destroy_finished.store(true, Ordering::SeqCst);
    }
}

fn spawn_engine(witness: &Arc<Witness>) -> (ShutdownHandle, thread::JoinHandle<Engine<HeadlessBackend>>) {
    let (backend, controller) = HeadlessBackend::pair();
    let mut engine = Engine::new(
        backend,
        EngineConfig::default().frame_rate(FrameRate::Limited(200.0)),
    );
    let handle = engine.shutdown_handle();
    let mut game = Spinner {
        witness: Arc::clone(witness),
    };
    let join = thread::spawn(move || {
        let _controller = controller;
        engine.run(&mut game).unwrap();
        engine
    });
    (handle, join)
}

fn wait_until_running(witness: &Witness) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while !witness.running.load(Ordering::SeqCst) {
        assert!(std::time::Instant::now() < deadline, "engine never started");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn waiter_returns_only_after_teardown() {
    let witness = Arc::new(Witness::default());
    let (handle, join) = spawn_engine(&witness);
    wait_until_running(&witness);
    assert_eq!(handle.state(), EngineState::Running);

    handle.request_shutdown();
    handle.wait_until_stopped();

    assert!(witness.destroy_finished.load(Ordering::SeqCst));
    assert_eq!(handle.state(), EngineState::Stopped);
    let engine = join.join().unwrap();
    assert!(!engine.backend().is_open());
    assert_eq!(engine.backend().open_close_counts(), (1, 1));
}

#[test]
fn many_requesters_get_one_teardown() {
    let witness = Arc::new(Witness::default());
    let (handle, join) = spawn_engine(&witness);
    wait_until_running(&witness);

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            let witness = Arc::clone(&witness);
            thread::spawn(move || {
                handle.request_shutdown();
                handle.wait_until_stopped();
                assert!(witness.destroy_finished.load(Ordering::SeqCst));
            })
        })
        .collect();
    for waiter in waiters {
        waiter.join().unwrap();
    }
    join.join().unwrap();
    assert_eq!(witness.destroys.load(Ordering::SeqCst), 1);
}

#[test]
fn timed_wait_gives_up_while_running() {
    let witness = Arc::new(Witness::default());
    let (handle, join) = spawn_engine(&witness);
    wait_until_running(&witness);

    assert!(!handle.wait_until_stopped_timeout(Duration::from_millis(30)));
    handle.request_shutdown();
    assert!(handle.wait_until_stopped_timeout(Duration::from_secs(5)));
    join.join().unwrap();
}

#[test]
fn waiting_on_a_stopped_engine_returns_at_once() {
    let witness = Arc::new(Witness::default());
    let (handle, join) = spawn_engine(&witness);
    wait_until_running(&witness);
    handle.request_shutdown();
    join.join().unwrap();

    handle.wait_until_stopped();
    assert!(handle.wait_until_stopped_timeout(Duration::ZERO));
}
