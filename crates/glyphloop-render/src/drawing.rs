#![forbid(unsafe_code)]

//! Drawing primitives.
//!
//! [`Draw`] needs two things from a surface: its size and a clipped cell
//! write. Everything else (lines, circles, rectangles, text, blits,
//! borders) is provided on top of those, so every primitive clips the same
//! way and none of them can fail. Coordinates may be anywhere in the `i32`
//! range; work is bounded by the part that lands on the surface.
//!
//! Lines use Bresenham's algorithm; circles use the midpoint algorithm.

use crate::cell::{Attr, Cell};
use crate::glyph;
use crate::grid::Grid;

/// Glyph set for [`Draw::draw_border`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxChars {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
}

impl BoxChars {
    pub const SINGLE: Self = Self {
        top_left: glyph::TOP_LEFT,
        top_right: glyph::TOP_RIGHT,
        bottom_left: glyph::BOTTOM_LEFT,
        bottom_right: glyph::BOTTOM_RIGHT,
        horizontal: glyph::HORIZONTAL,
        vertical: glyph::VERTICAL,
    };

    pub const DOUBLE: Self = Self {
        top_left: glyph::DOUBLE_TOP_LEFT,
        top_right: glyph::DOUBLE_TOP_RIGHT,
        bottom_left: glyph::DOUBLE_BOTTOM_LEFT,
        bottom_right: glyph::DOUBLE_BOTTOM_RIGHT,
        horizontal: glyph::DOUBLE_HORIZONTAL,
        vertical: glyph::DOUBLE_VERTICAL,
    };

    pub const ASCII: Self = Self {
        top_left: '+',
        top_right: '+',
        bottom_left: '+',
        bottom_right: '+',
        horizontal: '-',
        vertical: '|',
    };
}

/// Drawing operations over a clipped cell surface.
pub trait Draw {
    /// `(width, height)` of the surface.
    fn extent(&self) -> (u16, u16);

    /// Write one cell; out-of-range writes are dropped.
    fn put(&mut self, x: i32, y: i32, cell: Cell);

    fn draw_pixel(&mut self, x: i32, y: i32, cell: Cell) {
        self.put(x, y, cell);
    }

    /// Fill the half-open rectangle `[x1, x2) x [y1, y2)`, clamped to the
    /// surface.
    fn draw_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, cell: Cell) {
        let (w, h) = self.extent();
        let (x1, y1) = (x1.max(0), y1.max(0));
        let (x2, y2) = (x2.min(i32::from(w)), y2.min(i32::from(h)));
        for y in y1..y2 {
            for x in x1..x2 {
                self.put(x, y, cell);
            }
        }
    }

    /// Fill a `width x height` block whose top-left corner is `(x, y)`.
    fn draw_box(&mut self, x: i32, y: i32, width: i32, height: i32, cell: Cell) {
        self.draw_rect(
            x,
            y,
            x.saturating_add(width),
            y.saturating_add(height),
            cell,
        );
    }

    /// Line from `(x1, y1)` to `(x2, y2)`, both ends inclusive.
    ///
    /// Only the steps whose major-axis coordinate lies on the surface are
    /// walked, so the cost is bounded by the surface size.
    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, cell: Cell) {
        let (w, h) = self.extent();
        let (dx, dy) = (i64::from(x2) - i64::from(x1), i64::from(y2) - i64::from(y1));
        let x_major = dy.abs() <= dx.abs();
        let forward = if x_major { dx >= 0 } else { dy >= 0 };
        let ((sx, sy), (ex, ey)) = if forward {
            ((x1, y1), (x2, y2))
        } else {
            ((x2, y2), (x1, y1))
        };
        let (start, minor, end, minor_end, limit) = if x_major {
            (sx, sy, ex, ey, w)
        } else {
            (sy, sx, ey, ex, h)
        };
        let (start, minor) = (i64::from(start), i64::from(minor));
        let run = i64::from(end) - start;
        let rise = i64::from(minor_end) - minor;

        let first = (-start).max(0);
        let last = (i64::from(limit) - 1 - start).min(run);
        for step in first..=last {
            let m = minor + rise.signum() * minor_offset(step, run, rise.abs(), !x_major);
            if x_major {
                put_wide(self, start + step, m, cell);
            } else {
                put_wide(self, m, start + step, cell);
            }
        }
    }

    /// Circle outline of radius `r` around `(cx, cy)`.
    fn draw_circle(&mut self, cx: i32, cy: i32, r: i32, cell: Cell) {
        if r < 0 || !circle_visible(self.extent(), cx, cy, r) {
            return;
        }
        let (cx, cy) = (i64::from(cx), i64::from(cy));
        let (mut x, mut y, mut p) = (i64::from(r), 0i64, 1 - i64::from(r));
        while x >= y {
            for (ox, oy) in [
                (x, y),
                (x, -y),
                (-y, x),
                (-y, -x),
                (-x, -y),
                (-x, y),
                (y, -x),
                (y, x),
            ] {
                put_wide(self, cx + ox, cy + oy, cell);
            }
            y += 1;
            if p < 0 {
                p += 2 * y + 1;
            } else {
                x -= 1;
                p += 2 * (y - x + 1);
            }
        }
    }

    /// Filled circle of radius `r` around `(cx, cy)`.
    fn fill_circle(&mut self, cx: i32, cy: i32, r: i32, cell: Cell) {
        if r < 0 || !circle_visible(self.extent(), cx, cy, r) {
            return;
        }
        let (cx, cy) = (i64::from(cx), i64::from(cy));
        let (mut x, mut y, mut p) = (i64::from(r), 0i64, 1 - i64::from(r));
        while x >= y {
            fill_column(self, cx + x, cy - y, cy + y, cell);
            fill_column(self, cx - y, cy - x, cy + x, cell);
            fill_column(self, cx - x, cy - y, cy + y, cell);
            fill_column(self, cx + y, cy - x, cy + x, cell);
            y += 1;
            if p < 0 {
                p += 2 * y + 1;
            } else {
                x -= 1;
                p += 2 * (y - x + 1);
            }
        }
    }

    /// Write `text` left to right from `(x, y)` in one attribute.
    ///
    /// Returns the column after the last glyph, saturating at `i32::MAX`.
    fn draw_text(&mut self, x: i32, y: i32, text: &str, attr: Attr) -> i32 {
        let mut col = i64::from(x);
        for ch in text.chars() {
            put_wide(self, col, i64::from(y), Cell::new(ch, attr));
            col += 1;
        }
        i32::try_from(col).unwrap_or(i32::MAX)
    }

    /// Write consecutive segments, each in its own attribute.
    ///
    /// Returns the column after the last glyph.
    fn draw_segments(&mut self, x: i32, y: i32, segments: &[(&str, Attr)]) -> i32 {
        segments
            .iter()
            .fold(x, |col, (text, attr)| self.draw_text(col, y, text, *attr))
    }

    /// Copy a row-major `width x height` block of cells to `(x, y)`.
    ///
    /// Cells falling outside the surface are dropped; a short `source`
    /// draws only the cells it has.
    fn blit(&mut self, x: i32, y: i32, width: u16, height: u16, source: &[Cell]) {
        if width == 0 {
            return;
        }
        for (row, cells) in source
            .chunks(width as usize)
            .take(height as usize)
            .enumerate()
        {
            for (col, cell) in cells.iter().enumerate() {
                put_wide(self, i64::from(x) + col as i64, i64::from(y) + row as i64, *cell);
            }
        }
    }

    /// Frame a `width x height` area with `chars`.
    ///
    /// A one-cell-thick area degenerates to a straight line.
    fn draw_border(&mut self, x: i32, y: i32, width: i32, height: i32, chars: BoxChars, attr: Attr) {
        if width <= 0 || height <= 0 {
            return;
        }
        let (x, y) = (i64::from(x), i64::from(y));
        let (right, bottom) = (x + i64::from(width) - 1, y + i64::from(height) - 1);
        let horizontal = Cell::new(chars.horizontal, attr);
        let vertical = Cell::new(chars.vertical, attr);
        if height == 1 {
            fill_row(self, y, x, right, horizontal);
            return;
        }
        if width == 1 {
            fill_column(self, x, y, bottom, vertical);
            return;
        }
        fill_row(self, y, x + 1, right - 1, horizontal);
        fill_row(self, bottom, x + 1, right - 1, horizontal);
        fill_column(self, x, y + 1, bottom - 1, vertical);
        fill_column(self, right, y + 1, bottom - 1, vertical);
        put_wide(self, x, y, Cell::new(chars.top_left, attr));
        put_wide(self, right, y, Cell::new(chars.top_right, attr));
        put_wide(self, x, bottom, Cell::new(chars.bottom_left, attr));
        put_wide(self, right, bottom, Cell::new(chars.bottom_right, attr));
    }
}

// ── Wide-coordinate helpers ─────────────────────────────────────────────

/// [`Draw::put`] for coordinates computed in `i64`; anything outside the
/// `i32` range is off every surface.
fn put_wide<D: Draw + ?Sized>(surface: &mut D, x: i64, y: i64, cell: Cell) {
    if let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) {
        surface.put(x, y, cell);
    }
}

/// Cells `(x, from..=to)`, clamped to the surface height.
fn fill_column<D: Draw + ?Sized>(surface: &mut D, x: i64, from: i64, to: i64, cell: Cell) {
    let (w, h) = surface.extent();
    if !(0..i64::from(w)).contains(&x) {
        return;
    }
    for y in from.max(0)..=to.min(i64::from(h) - 1) {
        put_wide(surface, x, y, cell);
    }
}

/// Cells `(from..=to, y)`, clamped to the surface width.
fn fill_row<D: Draw + ?Sized>(surface: &mut D, y: i64, from: i64, to: i64, cell: Cell) {
    let (w, h) = surface.extent();
    if !(0..i64::from(h)).contains(&y) {
        return;
    }
    for x in from.max(0)..=to.min(i64::from(w) - 1) {
        put_wide(surface, x, y, cell);
    }
}

/// Minor-axis offset of Bresenham step `step` on a line spanning `run`
/// major and `rise` minor cells.
///
/// Equal to the incremental error-term walk: the x-major walk moves on a
/// zero error term, the y-major walk (`strict`) does not.
fn minor_offset(step: i64, run: i64, rise: i64, strict: bool) -> i64 {
    if run == 0 {
        return 0;
    }
    let num = 2 * i128::from(step) * i128::from(rise) + i128::from(run) - i128::from(strict);
    // At most `rise`, so it fits back in an i64.
    (num / (2 * i128::from(run))) as i64
}

fn circle_visible((w, h): (u16, u16), cx: i32, cy: i32, r: i32) -> bool {
    let (cx, cy, r) = (i64::from(cx), i64::from(cy), i64::from(r));
    cx + r >= 0 && cy + r >= 0 && cx - r < i64::from(w) && cy - r < i64::from(h)
}

impl Draw for Grid {
    #[inline]
    fn extent(&self) -> (u16, u16) {
        self.size()
    }

    #[inline]
    fn put(&mut self, x: i32, y: i32, cell: Cell) {
        self.set(x, y, cell);
    }
}
