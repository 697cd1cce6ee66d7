//! The demo scene.

use std::collections::VecDeque;
use std::time::Duration;

use glyphloop::render::palette::GRAYSCALE_LEVELS;
use glyphloop::{
    Attr, BoxChars, Cell, Color, Context, Draw, Flow, FrameRate, Game, Key, KeyEvent, MouseButton,
    Timer, glyph, grayscale,
};

/// Cells per second while a movement key is held.
const SPEED: f64 = 12.0;
const BLINK: Duration = Duration::from_millis(500);
const EVENT_LOG_LINES: usize = 4;
/// Rows below the play area: grayscale bar, then the event log.
const FOOTER_ROWS: u16 = 1 + EVENT_LOG_LINES as u16;
/// Rows above the play area: status and last key.
const HEADER_ROWS: u16 = 2;

const TEXT: Attr = Attr::fg_only(Color::Gray);
const ACCENT: Attr = Attr::fg_only(Color::Yellow);
const DIM: Attr = Attr::fg_only(Color::DarkGray);

pub struct Scene {
    x: f64,
    y: f64,
    brush: u8,
    /// Painted cells of the play area, row-major.
    canvas: Vec<Option<Color>>,
    canvas_size: (u16, u16),
    blink: Timer,
    cursor_on: bool,
    events: VecDeque<String>,
    frames: u64,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            brush: Color::Cyan.index(),
            canvas: Vec::new(),
            canvas_size: (0, 0),
            blink: Timer::new(),
            cursor_on: true,
            events: VecDeque::with_capacity(EVENT_LOG_LINES),
            frames: 0,
        }
    }

    /// Frames updated so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Interior of the bordered play area as `(x, y, width, height)`.
    fn play_area(width: u16, height: u16) -> (i32, i32, u16, u16) {
        let inner_w = width.saturating_sub(2);
        let inner_h = height.saturating_sub(HEADER_ROWS + FOOTER_ROWS + 2);
        (1, i32::from(HEADER_ROWS) + 1, inner_w, inner_h)
    }

    fn fit_canvas(&mut self, width: u16, height: u16) {
        if self.canvas_size != (width, height) {
            self.canvas = vec![None; usize::from(width) * usize::from(height)];
            self.canvas_size = (width, height);
        }
    }

    fn wants_quit(ctx: &Context<'_>) -> bool {
        ctx.key_named(Key::Escape).pressed
            || (ctx.key_named(Key::Ctrl).is_active() && ctx.key_named(Key::C).pressed)
    }

    fn log_events(&mut self, events: &[KeyEvent]) {
        for event in events {
            let name = match event.code.named() {
                Some(key) => format!("{key:?}"),
                None => format!("0x{:02X}", event.code.raw()),
            };
            let what = if event.is_press() {
                "press"
            } else if event.is_repeat() {
                "repeat"
            } else {
                "release"
            };
            if self.events.len() == EVENT_LOG_LINES {
                self.events.pop_front();
            }
            self.events.push_back(format!("{name} {what}"));
        }
    }

    fn movement(ctx: &Context<'_>) -> (f64, f64) {
        let held = |a: Key, b: Key| ctx.key_named(a).held || ctx.key_named(b).held;
        let mut dx = 0.0;
        let mut dy = 0.0;
        if held(Key::Left, Key::A) {
            dx -= 1.0;
        }
        if held(Key::Right, Key::D) {
            dx += 1.0;
        }
        if held(Key::Up, Key::W) {
            dy -= 1.0;
        }
        if held(Key::Down, Key::S) {
            dy += 1.0;
        }
        (dx, dy)
    }

    fn paint(&mut self, ctx: &Context<'_>, area: (i32, i32, u16, u16)) {
        let (ax, ay, aw, ah) = area;
        let mouse = ctx.mouse();
        let (cx, cy) = (mouse.x - ax, mouse.y - ay);
        if cx < 0 || cy < 0 || cx >= i32::from(aw) || cy >= i32::from(ah) {
            return;
        }
        let Ok(index) = usize::try_from(cy * i32::from(aw) + cx) else {
            return;
        };
        if ctx.mouse_button(MouseButton::Left).held {
            self.canvas[index] = Some(Color::from_index(self.brush));
        } else if ctx.mouse_button(MouseButton::Right).held {
            self.canvas[index] = None;
        }
    }

    fn draw(&self, ctx: &mut Context<'_>, area: (i32, i32, u16, u16)) {
        let status = format!(
            "fps {:6.1}  frame {:>6}  rate {}  mouse {:>3},{:<3} {}",
            ctx.average_fps(),
            ctx.frame_count(),
            ctx.frame_rate(),
            ctx.mouse().x,
            ctx.mouse().y,
            if ctx.in_focus() { "focused" } else { "unfocused" },
        );
        let last = match ctx.last_key() {
            Some(key) => format!("{key:?}"),
            None => "-".to_owned(),
        };
        let brush = Color::from_index(self.brush);
        let (width, height) = (ctx.width(), ctx.height());
        let (ax, ay, aw, ah) = area;
        let grid = ctx.grid_mut();
        grid.clear();

        grid.draw_text(0, 0, &status, TEXT);
        let col = grid.draw_segments(0, 1, &[("last key ", DIM), (&last, ACCENT), ("  brush ", DIM)]);
        grid.put(col, 1, Cell::solid(Attr::fg_only(brush)));

        grid.draw_border(
            0,
            i32::from(HEADER_ROWS),
            i32::from(width),
            i32::from(ah) + 2,
            BoxChars::SINGLE,
            DIM,
        );
        for (i, painted) in self.canvas.iter().enumerate() {
            if let Some(color) = painted {
                let x = ax + (i % usize::from(aw)) as i32;
                let y = ay + (i / usize::from(aw)) as i32;
                grid.put(x, y, Cell::new(glyph::HALF, Attr::fg_only(*color)));
            }
        }
        if self.cursor_on {
            grid.put(
                ax + self.x as i32,
                ay + self.y as i32,
                Cell::new('@', Attr::fg_only(Color::White)),
            );
        }

        let bar_y = i32::from(height.saturating_sub(FOOTER_ROWS));
        let step = (i32::from(width) / GRAYSCALE_LEVELS as i32).max(1);
        for level in 0..GRAYSCALE_LEVELS {
            let x1 = level as i32 * step;
            grid.draw_rect(x1, bar_y, x1 + step, bar_y + 1, grayscale(level));
        }
        for (row, line) in self.events.iter().enumerate() {
            grid.draw_text(1, bar_y + 1 + row as i32, line, TEXT);
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for Scene {
    fn init(&mut self, ctx: &mut Context<'_>) {
        let (_, _, aw, ah) = Self::play_area(ctx.width(), ctx.height());
        self.fit_canvas(aw, ah);
        self.blink.start(ctx.elapsed(), BLINK);
        tracing::info!(width = ctx.width(), height = ctx.height(), "demo scene ready");
    }

    fn update(&mut self, ctx: &mut Context<'_>, dt: f64) -> Flow {
        self.frames += 1;
        self.log_events(ctx.events());
        if Self::wants_quit(ctx) {
            return Flow::Exit;
        }

        let area = Self::play_area(ctx.width(), ctx.height());
        self.fit_canvas(area.2, area.3);

        if ctx.key_named(Key::Space).pressed {
            let next = if ctx.frame_rate().is_limited() {
                FrameRate::Unlimited
            } else {
                FrameRate::default()
            };
            tracing::debug!(%next, "frame rate toggled");
            ctx.set_frame_rate(next);
        }
        if ctx.wheel_forward() {
            self.brush = (self.brush + 1) % 16;
        }
        if ctx.wheel_backward() {
            self.brush = (self.brush + 15) % 16;
        }

        let (dx, dy) = Self::movement(ctx);
        let max_x = f64::from(area.2.saturating_sub(1));
        let max_y = f64::from(area.3.saturating_sub(1));
        self.x = (self.x + dx * SPEED * dt).clamp(0.0, max_x);
        self.y = (self.y + dy * SPEED * dt).clamp(0.0, max_y);

        if self.blink.ready(ctx.elapsed()) {
            self.cursor_on = !self.cursor_on;
            self.blink.start(ctx.elapsed(), BLINK);
        }

        self.paint(ctx, area);
        self.draw(ctx, area);
        Flow::Continue
    }

    fn destroy(&mut self, _ctx: &mut Context<'_>) {
        tracing::info!(frames = self.frames, "demo scene destroyed");
    }
}
