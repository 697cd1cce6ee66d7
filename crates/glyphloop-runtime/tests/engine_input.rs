#![forbid(unsafe_code)]

//! Polled input as seen from inside `update`.
//!
//! The game scripts the controller itself, so each change is sampled at the
//! start of the following frame and the expected per-frame states are exact.

use glyphloop_core::{Key, KeyCode, KeyState, MouseButton, MouseButtons, MousePosition};
use glyphloop_runtime::{
    Context, Engine, EngineConfig, Flow, FrameRate, Game, HeadlessBackend, HeadlessController,
    ManualClock,
};

/// Runs `script` for each frame, recording whatever `observe` returns.
struct Scripted<S, P, T> {
    controller: HeadlessController,
    script: S,
    observe: P,
    frames: u64,
    seen: Vec<T>,
}

impl<S, P, T> Game for Scripted<S, P, T>
where
    S: FnMut(&HeadlessController, u64),
    P: FnMut(&Context<'_>) -> T,
{
    fn init(&mut self, _ctx: &mut Context<'_>) {}

    fn update(&mut self, ctx: &mut Context<'_>, _dt: f64) -> Flow {
        let frame = ctx.frame_count();
        self.seen.push((self.observe)(ctx));
        (self.script)(&self.controller, frame);
        if frame + 1 >= self.frames {
            Flow::Exit
        } else {
            Flow::Continue
        }
    }
}

fn run<S, P, T>(frames: u64, script: S, observe: P) -> Vec<T>
where
    S: FnMut(&HeadlessController, u64),
    P: FnMut(&Context<'_>) -> T,
{
    let (backend, controller) = HeadlessBackend::pair();
    let mut engine = Engine::new(
        backend.with_manual_clock(ManualClock::new()),
        EngineConfig::default()
            .frame_rate(FrameRate::Unlimited)
            .capture_keys(false),
    );
    let mut game = Scripted {
        controller,
        script,
        observe,
        frames,
        seen: Vec::new(),
    };
    engine.run(&mut game).unwrap();
    game.seen
}

#[test]
fn down_poll_poll_up_poll() {
    let states = run(
        5,
        |c, frame| match frame {
            0 => c.press(Key::A),
            2 => c.release(Key::A),
            _ => {}
        },
        |ctx| ctx.key_named(Key::A),
    );
    assert_eq!(
        states,
        [
            KeyState::IDLE,
            KeyState::PRESSED,
            KeyState::HELD,
            KeyState::RELEASED,
            KeyState::IDLE,
        ]
    );
}

#[test]
fn last_key_tracks_the_latest_change() {
    let seen = run(
        4,
        |c, frame| match frame {
            0 => c.press(Key::Space),
            1 => c.press(Key::Left),
            _ => {}
        },
        |ctx| (ctx.last_key_code(), ctx.last_key()),
    );
    assert_eq!(seen[0], (KeyCode::EMPTY, KeyCode::EMPTY.named()));
    assert_eq!(seen[1].1, Some(Key::Space));
    assert_eq!(seen[2].1, Some(Key::Left));
    assert_eq!(seen[3].1, Some(Key::Left));
}

#[test]
fn wheel_is_a_one_frame_pulse() {
    let seen = run(
        4,
        |c, frame| {
            if frame == 0 {
                c.wheel(false);
            }
        },
        |ctx| {
            (
                ctx.wheel_backward(),
                ctx.mouse_button(MouseButton::WheelBackward),
            )
        },
    );
    assert_eq!(seen[0], (false, KeyState::IDLE));
    assert_eq!(seen[1], (true, KeyState::PRESSED));
    assert_eq!(seen[2], (false, KeyState::RELEASED));
    assert_eq!(seen[3], (false, KeyState::IDLE));
}

#[test]
fn mouse_buttons_and_position() {
    let seen = run(
        4,
        |c, frame| match frame {
            0 => {
                c.mouse_move(7, 3);
                c.mouse_buttons(MouseButtons::LEFT | MouseButtons::M2);
            }
            1 => {
                c.mouse_buttons(MouseButtons::M2);
            }
            _ => {}
        },
        |ctx| {
            (
                ctx.mouse(),
                ctx.mouse_button(MouseButton::Left),
                ctx.mouse_button(MouseButton::M2),
            )
        },
    );
    assert_eq!(seen[1].0, MousePosition { x: 7, y: 3 });
    assert_eq!(seen[1].1, KeyState::PRESSED);
    assert_eq!(seen[1].2, KeyState::PRESSED);
    assert_eq!(seen[2].1, KeyState::RELEASED);
    assert_eq!(seen[2].2, KeyState::HELD);
    assert_eq!(seen[3].1, KeyState::IDLE);
}

#[test]
fn focus_changes_are_reported() {
    let seen = run(
        3,
        |c, frame| {
            if frame == 0 {
                c.focus(false);
            }
        },
        |ctx| ctx.in_focus(),
    );
    assert_eq!(seen, [true, false, false]);
}
