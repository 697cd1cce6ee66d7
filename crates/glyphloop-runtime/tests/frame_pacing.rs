#![forbid(unsafe_code)]

//! Frame pacing against the wall clock and against a manual clock.

use std::time::{Duration, Instant};

use glyphloop_runtime::{
    Context, Engine, EngineConfig, Flow, FrameRate, Game, HeadlessBackend, ManualClock,
};

struct Frames {
    limit: u64,
    deltas: Vec<f64>,
    last_fps: f64,
}

impl Frames {
    fn new(limit: u64) -> Self {
        Self {
            limit,
            deltas: Vec::new(),
            last_fps: 0.0,
        }
    }
}

impl Game for Frames {
    fn init(&mut self, _ctx: &mut Context<'_>) {}

    fn update(&mut self, ctx: &mut Context<'_>, dt: f64) -> Flow {
        self.deltas.push(dt);
        self.last_fps = ctx.average_fps();
        if ctx.frame_count() + 1 >= self.limit {
            Flow::Exit
        } else {
            Flow::Continue
        }
    }
}

#[test]
fn limited_loop_runs_near_the_target_rate() {
    let (backend, _controller) = HeadlessBackend::pair();
    let mut engine = Engine::new(
        backend,
        EngineConfig::default()
            .frame_rate(FrameRate::Limited(50.0))
            .capture_keys(false),
    );
    let mut game = Frames::new(30);
    let started = Instant::now();
    engine.run(&mut game).unwrap();
    let elapsed = started.elapsed();

    // 29 paced gaps of 20ms; sleeping can only overshoot.
    assert!(elapsed >= Duration::from_millis(29 * 20 - 5), "ran too fast: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(29 * 20 * 2), "ran too slow: {elapsed:?}");
    assert!(
        (35.0..=55.0).contains(&game.last_fps),
        "average fps {} far from 50",
        game.last_fps
    );
}

#[test]
fn manual_clock_pacing_is_exact() {
    let (backend, _controller) = HeadlessBackend::pair();
    let clock = ManualClock::new();
    let mut engine = Engine::new(
        backend.with_manual_clock(clock.clone()),
        EngineConfig::default()
            .frame_rate(FrameRate::Limited(25.0))
            .capture_keys(false),
    );
    let mut game = Frames::new(20);
    engine.run(&mut game).unwrap();

    assert_eq!(game.deltas[0], 0.0);
    for dt in &game.deltas[1..] {
        assert!((dt - 0.04).abs() < 1e-9, "delta {dt}");
    }
    assert!((game.last_fps - 25.0).abs() < 1e-6);
    // Twenty frames, each followed by a full-interval sleep.
    assert_eq!(clock.now(), Duration::from_millis(20 * 40));
}

#[test]
fn unlimited_loop_does_not_sleep() {
    let (backend, _controller) = HeadlessBackend::pair();
    let clock = ManualClock::new();
    let mut engine = Engine::new(
        backend.with_manual_clock(clock.clone()),
        EngineConfig::default()
            .frame_rate(FrameRate::Unlimited)
            .capture_keys(false),
    );
    engine.run(&mut Frames::new(50)).unwrap();
    assert_eq!(clock.now(), Duration::ZERO);
}
