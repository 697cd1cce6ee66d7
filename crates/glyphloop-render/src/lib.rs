#![forbid(unsafe_code)]

//! Render kernel: cells, color attributes, the cell grid, and drawing.
//!
//! # Role in glyphloop
//! `glyphloop-render` owns the data the game writes every frame. A [`Grid`]
//! is a row-major block of [`Cell`]s, each a glyph plus a packed
//! foreground/background [`Attr`]. Drawing primitives live on the [`Draw`]
//! trait and are pure functions of the grid: they clip to its bounds and
//! never fail.
//!
//! # How it fits in the system
//! The runtime allocates one grid per engine, lends it to `update` through
//! the context, and hands it to the backend presenter after each frame.
//! Nothing in this crate touches a terminal.

pub mod cell;
pub mod drawing;
pub mod glyph;
pub mod grid;
pub mod palette;

pub use cell::{Attr, Cell, Color};
pub use drawing::{BoxChars, Draw};
pub use grid::Grid;
pub use palette::grayscale;
