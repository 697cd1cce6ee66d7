#![forbid(unsafe_code)]

//! Grayscale ramp built from shade glyphs and the four gray console colors.

use crate::cell::{Attr, Cell, Color};
use crate::glyph::{HALF, SOLID};

/// Number of grayscale levels.
pub const GRAYSCALE_LEVELS: usize = 8;

const GRAYSCALE: [Cell; GRAYSCALE_LEVELS] = [
    Cell::new(SOLID, Attr::new(Color::Black, Color::Black)),
    Cell::new(HALF, Attr::new(Color::Black, Color::DarkGray)),
    Cell::new(SOLID, Attr::new(Color::DarkGray, Color::Black)),
    Cell::new(HALF, Attr::new(Color::Black, Color::Gray)),
    Cell::new(HALF, Attr::new(Color::DarkGray, Color::Gray)),
    Cell::new(SOLID, Attr::new(Color::Gray, Color::Black)),
    Cell::new(HALF, Attr::new(Color::Gray, Color::White)),
    Cell::new(SOLID, Attr::new(Color::White, Color::Black)),
];

/// Grayscale cell for `index`, darkest at 0. Indices past the end clamp to
/// white.
#[must_use]
pub const fn grayscale(index: usize) -> Cell {
    if index < GRAYSCALE_LEVELS {
        GRAYSCALE[index]
    } else {
        GRAYSCALE[GRAYSCALE_LEVELS - 1]
    }
}

/// Grayscale cell for an intensity in `0.0..=1.0`.
#[must_use]
pub fn grayscale_for(intensity: f64) -> Cell {
    let clamped = if intensity.is_nan() {
        0.0
    } else {
        intensity.clamp(0.0, 1.0)
    };
    let index = (clamped * (GRAYSCALE_LEVELS - 1) as f64).round() as usize;
    grayscale(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_endpoints() {
        assert_eq!(grayscale(0).attr.fg(), Color::Black);
        assert_eq!(grayscale(7), Cell::new(SOLID, Attr::fg_only(Color::White)));
        assert_eq!(grayscale(100), grayscale(7));
    }

    #[test]
    fn intensity_maps_onto_ramp() {
        assert_eq!(grayscale_for(0.0), grayscale(0));
        assert_eq!(grayscale_for(1.0), grayscale(7));
        assert_eq!(grayscale_for(2.0), grayscale(7));
        assert_eq!(grayscale_for(-1.0), grayscale(0));
        assert_eq!(grayscale_for(f64::NAN), grayscale(0));
    }
}
