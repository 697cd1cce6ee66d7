#![forbid(unsafe_code)]

//! Presenter: state-tracked grid output.
//!
//! The presenter remembers the last grid it wrote and only re-emits cells
//! that changed, tracking the active colors so SGR sequences are written
//! only when the attribute changes.
//!
//! # Design Principles
//!
//! - **Diff against last frame**: unchanged cells produce no output.
//! - **Cell scaling**: each grid cell is drawn as a `width x height` block of
//!   terminal cells.
//! - **Single write**: all output is buffered and flushed once per frame.
//! - **Narrow glyphs only**: glyphs that are not exactly one column wide are
//!   replaced so the grid never shears.

use std::io::{self, BufWriter, Write};

use crossterm::style::{Color as CtColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, queue, terminal};
use glyphloop_backend::{BackendPresenter, CellScale};
use glyphloop_render::{Attr, Cell, Color, Grid};
use unicode_width::UnicodeWidthChar;

/// Size of the internal write buffer (64KB).
const BUFFER_CAPACITY: usize = 64 * 1024;

/// Stand-in for glyphs that cannot occupy exactly one column.
pub const REPLACEMENT_GLYPH: char = '?';

/// State-tracked terminal presenter.
pub struct TtyPresenter<W: Write> {
    writer: BufWriter<W>,
    previous: Option<Grid>,
    scale: CellScale,
    current_attr: Option<Attr>,
    title: Option<String>,
    cursor_visible: bool,
    cursor_position: Option<(u16, u16)>,
    frames: u64,
}

impl<W: Write> TtyPresenter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(BUFFER_CAPACITY, writer),
            previous: None,
            scale: CellScale::UNIT,
            current_attr: None,
            title: None,
            cursor_visible: false,
            cursor_position: None,
            frames: 0,
        }
    }

    /// Set the cell scale; forces a full repaint on the next frame.
    pub fn set_scale(&mut self, scale: CellScale) {
        self.scale = CellScale::new(scale.width.max(1), scale.height.max(1));
        self.invalidate();
    }

    /// Forget the last frame so the next present repaints everything.
    pub fn invalidate(&mut self) {
        self.previous = None;
        self.current_attr = None;
    }

    #[must_use]
    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    /// The underlying writer.
    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    fn write_cell(&mut self, x: u16, y: u16, cell: Cell) -> io::Result<()> {
        if self.current_attr != Some(cell.attr) {
            queue!(
                self.writer,
                SetForegroundColor(terminal_color(cell.attr.fg())),
                SetBackgroundColor(terminal_color(cell.attr.bg()))
            )?;
            self.current_attr = Some(cell.attr);
        }
        let glyph = printable(cell.glyph);
        let (sw, sh) = (self.scale.width, self.scale.height);
        let col = x.saturating_mul(sw);
        for dy in 0..sh {
            queue!(self.writer, cursor::MoveTo(col, y.saturating_mul(sh).saturating_add(dy)))?;
            for _ in 0..sw {
                queue!(self.writer, Print(glyph))?;
            }
        }
        Ok(())
    }

    fn place_cursor(&mut self) -> io::Result<()> {
        if let (true, Some((x, y))) = (self.cursor_visible, self.cursor_position) {
            queue!(
                self.writer,
                cursor::MoveTo(
                    x.saturating_mul(self.scale.width),
                    y.saturating_mul(self.scale.height)
                )
            )?;
        }
        Ok(())
    }
}

impl<W: Write> BackendPresenter for TtyPresenter<W> {
    type Error = io::Error;

    fn present(&mut self, grid: &Grid) -> io::Result<()> {
        let full = self
            .previous
            .as_ref()
            .is_none_or(|prev| prev.size() != grid.size());
        if full {
            queue!(self.writer, ResetColor, terminal::Clear(terminal::ClearType::All))?;
            self.current_attr = None;
        }

        // Held outside `self` while cells are written; restored below.
        let previous = if full { None } else { self.previous.take() };
        let mut changed = 0usize;
        for (y, row) in grid.rows().enumerate().take(grid.height() as usize) {
            let prev_row = previous.as_ref().and_then(|p| p.row(y as u16));
            for (x, cell) in row.iter().enumerate() {
                if prev_row.is_some_and(|p| p[x] == *cell) {
                    continue;
                }
                changed += 1;
                if let Err(err) = self.write_cell(x as u16, y as u16, *cell) {
                    // The terminal state is unknown after a failed write.
                    self.invalidate();
                    return Err(err);
                }
            }
        }

        self.previous = Some(match previous {
            Some(mut prev) => {
                prev.clone_from(grid);
                prev
            }
            None => grid.clone(),
        });

        if let Err(err) = self.place_cursor().and_then(|()| self.writer.flush()) {
            self.invalidate();
            return Err(err);
        }
        self.frames += 1;
        tracing::trace!(changed, full, frame = self.frames, "grid presented");
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> io::Result<()> {
        if self.title.as_deref() == Some(title) {
            return Ok(());
        }
        queue!(self.writer, terminal::SetTitle(title))?;
        self.writer.flush()?;
        self.title = Some(title.to_owned());
        Ok(())
    }

    fn set_cursor_visible(&mut self, visible: bool) -> io::Result<()> {
        if visible {
            queue!(self.writer, cursor::Show)?;
        } else {
            queue!(self.writer, cursor::Hide)?;
        }
        self.cursor_visible = visible;
        self.place_cursor()?;
        self.writer.flush()
    }

    fn set_cursor_position(&mut self, x: u16, y: u16) -> io::Result<()> {
        self.cursor_position = Some((x, y));
        self.place_cursor()?;
        self.writer.flush()
    }
}

fn printable(glyph: char) -> char {
    match glyph {
        '\0' => ' ',
        c if c.width() == Some(1) => c,
        _ => REPLACEMENT_GLYPH,
    }
}

/// Console palette color to its terminal equivalent.
#[must_use]
pub fn terminal_color(color: Color) -> CtColor {
    match color {
        Color::Black => CtColor::Black,
        Color::DarkBlue => CtColor::DarkBlue,
        Color::DarkGreen => CtColor::DarkGreen,
        Color::DarkCyan => CtColor::DarkCyan,
        Color::DarkRed => CtColor::DarkRed,
        Color::DarkMagenta => CtColor::DarkMagenta,
        Color::DarkYellow => CtColor::DarkYellow,
        Color::Gray => CtColor::Grey,
        Color::DarkGray => CtColor::DarkGrey,
        Color::Blue => CtColor::Blue,
        Color::Green => CtColor::Green,
        Color::Cyan => CtColor::Cyan,
        Color::Red => CtColor::Red,
        Color::Magenta => CtColor::Magenta,
        Color::Yellow => CtColor::Yellow,
        Color::White => CtColor::White,
    }
}
