#![forbid(unsafe_code)]

//! The cell grid.
//!
//! A [`Grid`] is `width * height` [`Cell`]s in row-major order. Coordinates
//! are signed so callers can compute positions that fall off the grid;
//! every accessor bounds-checks and out-of-range writes are dropped.

use crate::cell::Cell;

/// Row-major block of cells.
#[derive(Debug, PartialEq, Eq)]
pub struct Grid {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Clone for Grid {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            cells: self.cells.clone(),
        }
    }

    // Keeps the cell allocation.
    fn clone_from(&mut self, source: &Self) {
        self.width = source.width;
        self.height = source.height;
        self.cells.clone_from(&source.cells);
    }
}

impl Grid {
    /// A blank grid.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; width as usize * height as usize],
        }
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < i32::from(self.width) && y < i32::from(self.height)
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.contains(x, y) {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Cell at `(x, y)`.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        self.index(x, y).map(move |i| &mut self.cells[i])
    }

    /// Write `cell` at `(x, y)`. Returns `false` if out of bounds.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        match self.get_mut(x, y) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Reset every cell to [`Cell::EMPTY`].
    pub fn clear(&mut self) {
        self.fill(Cell::EMPTY);
    }

    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Reallocate to a new size, blanking the content.
    ///
    /// A no-op when the size is unchanged.
    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) == self.size() {
            return;
        }
        *self = Self::new(width, height);
    }

    /// Up to `len` glyphs starting at `(x, y)`, stopping at the row end.
    ///
    /// Empty when `(x, y)` is outside the grid.
    #[must_use]
    pub fn read_string(&self, x: i32, y: i32, len: usize) -> String {
        let Some(start) = self.index(x, y) else {
            return String::new();
        };
        let available = (self.width as usize) - x as usize;
        self.cells[start..start + len.min(available)]
            .iter()
            .map(|c| c.glyph)
            .collect()
    }

    /// All cells, row-major.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Row `y`, if in range.
    #[must_use]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        Some(&self.cells[start..start + self.width as usize])
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        // chunks_exact panics on 0; a zero-width grid has no rows worth yielding.
        let width = (self.width as usize).max(1);
        self.cells.chunks_exact(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Attr, Color};

    #[test]
    fn new_grid_is_blank() {
        let grid = Grid::new(4, 3);
        assert_eq!(grid.cells().len(), 12);
        assert!(grid.cells().iter().all(|c| *c == Cell::EMPTY));
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut grid = Grid::new(2, 2);
        let cell = Cell::new('x', Attr::WHITE);
        assert!(!grid.set(-1, 0, cell));
        assert!(!grid.set(0, 2, cell));
        assert!(!grid.set(2, 0, cell));
        assert!(grid.set(1, 1, cell));
        assert_eq!(grid.get(1, 1), Some(cell));
        assert_eq!(grid.get(5, 5), None);
    }

    #[test]
    fn read_string_stops_at_row_end() {
        let mut grid = Grid::new(5, 2);
        for (i, ch) in "hello".chars().enumerate() {
            grid.set(i as i32, 0, Cell::new(ch, Attr::WHITE));
        }
        assert_eq!(grid.read_string(1, 0, 3), "ell");
        assert_eq!(grid.read_string(3, 0, 10), "lo");
        assert_eq!(grid.read_string(0, 5, 3), "");
        assert_eq!(grid.read_string(-1, 0, 3), "");
    }

    #[test]
    fn resize_reallocates_only_on_change() {
        let mut grid = Grid::new(3, 3);
        let cell = Cell::new('#', Attr::fg_only(Color::Red));
        grid.set(0, 0, cell);
        grid.resize(3, 3);
        assert_eq!(grid.get(0, 0), Some(cell));
        grid.resize(6, 2);
        assert_eq!(grid.size(), (6, 2));
        assert_eq!(grid.get(0, 0), Some(Cell::EMPTY));
    }

    #[test]
    fn rows_are_row_major() {
        let mut grid = Grid::new(2, 3);
        grid.set(1, 2, Cell::new('z', Attr::WHITE));
        let rows: Vec<&[Cell]> = grid.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][1].glyph, 'z');
        assert_eq!(grid.row(2), Some(rows[2]));
        assert_eq!(grid.row(3), None);
    }

    #[test]
    fn clear_blanks_everything() {
        let mut grid = Grid::new(2, 2);
        grid.fill(Cell::solid(Attr::WHITE));
        grid.clear();
        assert!(grid.cells().iter().all(|c| *c == Cell::EMPTY));
    }
}
