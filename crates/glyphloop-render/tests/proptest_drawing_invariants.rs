//! Property-based tests for drawing primitives.
//!
//! 1. **Clipping**: no primitive panics or changes the grid size, whatever
//!    the coordinates.
//!
//! 2. **Endpoints**: a line whose endpoints are on the grid draws both.
//!
//! 3. **Symmetry**: a line drawn from A to B covers the same cells as B to A.
//!
//! 4. **Rect coverage**: a clamped rectangle marks exactly the overlap of
//!    its half-open area with the grid.
//!
//! 5. **Extreme coordinates**: coordinates anywhere in the `i32` range never
//!    overflow.
//!
//! 6. **Clipping is a crop**: a line drawn on a small grid equals the same
//!    line drawn on a larger grid, cropped.

use glyphloop_render::{Attr, BoxChars, Cell, Draw, Grid};
use proptest::prelude::*;

const INK: Cell = Cell::new('#', Attr::WHITE);
const W: u16 = 24;
const H: u16 = 16;

fn coord() -> impl Strategy<Value = i32> {
    -200i32..200
}

fn on_grid() -> impl Strategy<Value = (i32, i32)> {
    (0..i32::from(W), 0..i32::from(H))
}

fn wide_coord() -> impl Strategy<Value = i32> {
    prop_oneof![
        Just(i32::MIN),
        Just(i32::MAX),
        i32::MIN..i32::MIN + 64,
        i32::MAX - 64..=i32::MAX,
        any::<i32>(),
        coord(),
    ]
}

fn marked(grid: &Grid) -> usize {
    grid.cells().iter().filter(|c| **c != Cell::EMPTY).count()
}

proptest! {
    #[test]
    fn primitives_clip(
        x1 in coord(), y1 in coord(), x2 in coord(), y2 in coord(), r in -5i32..120,
        text in "[a-z]{0,40}",
    ) {
        let mut grid = Grid::new(W, H);
        grid.draw_pixel(x1, y1, INK);
        grid.draw_line(x1, y1, x2, y2, INK);
        grid.draw_rect(x1, y1, x2, y2, INK);
        grid.draw_box(x1, y1, x2, y2, INK);
        grid.draw_circle(x1, y1, r, INK);
        grid.fill_circle(x2, y2, r, INK);
        grid.draw_text(x1, y2, &text, Attr::WHITE);
        grid.draw_border(x2, y1, x1, y2, BoxChars::DOUBLE, Attr::WHITE);
        grid.blit(x1, y1, 5, 5, &[INK; 25]);
        prop_assert_eq!(grid.size(), (W, H));
        prop_assert_eq!(grid.cells().len(), usize::from(W) * usize::from(H));
    }

    #[test]
    fn line_endpoints_drawn(a in on_grid(), b in on_grid()) {
        let mut grid = Grid::new(W, H);
        grid.draw_line(a.0, a.1, b.0, b.1, INK);
        prop_assert_eq!(grid.get(a.0, a.1), Some(INK));
        prop_assert_eq!(grid.get(b.0, b.1), Some(INK));
        let expected = (a.0 - b.0).abs().max((a.1 - b.1).abs()) as usize + 1;
        prop_assert_eq!(marked(&grid), expected);
    }

    #[test]
    fn line_direction_does_not_matter(a in on_grid(), b in on_grid()) {
        let mut forward = Grid::new(W, H);
        let mut backward = Grid::new(W, H);
        forward.draw_line(a.0, a.1, b.0, b.1, INK);
        backward.draw_line(b.0, b.1, a.0, a.1, INK);
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn rect_marks_overlap(x1 in coord(), y1 in coord(), x2 in coord(), y2 in coord()) {
        let mut grid = Grid::new(W, H);
        grid.draw_rect(x1, y1, x2, y2, INK);
        let w = (x2.min(i32::from(W)) - x1.max(0)).max(0) as usize;
        let h = (y2.min(i32::from(H)) - y1.max(0)).max(0) as usize;
        prop_assert_eq!(marked(&grid), w * h);
    }

    #[test]
    fn extreme_coordinates_do_not_overflow(
        x1 in wide_coord(), y1 in wide_coord(), x2 in wide_coord(), y2 in wide_coord(),
        r in -5i32..1000, text in "[a-z]{0,8}",
    ) {
        let mut grid = Grid::new(W, H);
        grid.draw_line(x1, y1, x2, y2, INK);
        grid.draw_rect(x1, y1, x2, y2, INK);
        grid.draw_box(x1, y1, x2, y2, INK);
        grid.draw_circle(x1, y1, r, INK);
        grid.fill_circle(x2, y2, r, INK);
        let end = grid.draw_text(x1, y2, &text, Attr::WHITE);
        prop_assert!(end >= x1);
        grid.draw_segments(x2, y1, &[(&text, Attr::WHITE), (&text, Attr::WHITE)]);
        grid.draw_border(x2, y1, x1, y2, BoxChars::SINGLE, Attr::WHITE);
        grid.blit(x1, y1, 5, 5, &[INK; 25]);
        prop_assert_eq!(grid.size(), (W, H));
    }

    #[test]
    fn clipped_line_matches_cropped_line(
        x1 in coord(), y1 in coord(), x2 in coord(), y2 in coord(),
    ) {
        let (ox, oy) = (i32::from(W), i32::from(H));
        let mut small = Grid::new(W, H);
        let mut large = Grid::new(W * 3, H * 3);
        small.draw_line(x1, y1, x2, y2, INK);
        large.draw_line(x1 + ox, y1 + oy, x2 + ox, y2 + oy, INK);
        for y in 0..i32::from(H) {
            for x in 0..i32::from(W) {
                prop_assert_eq!(small.get(x, y), large.get(x + ox, y + oy), "at ({}, {})", x, y);
            }
        }
    }
}
