#![forbid(unsafe_code)]

//! Shade and box-drawing glyphs.

/// Full block.
pub const SOLID: char = '\u{2588}';
/// Dark shade.
pub const THREE_QUARTERS: char = '\u{2593}';
/// Medium shade.
pub const HALF: char = '\u{2592}';
/// Light shade.
pub const QUARTER: char = '\u{2591}';

/// Shades from lightest to solid.
pub const SHADES: [char; 4] = [QUARTER, HALF, THREE_QUARTERS, SOLID];

// Single-line box drawing.
pub const TOP_LEFT: char = '\u{250C}';
pub const TOP_RIGHT: char = '\u{2510}';
pub const BOTTOM_LEFT: char = '\u{2514}';
pub const BOTTOM_RIGHT: char = '\u{2518}';
pub const HORIZONTAL: char = '\u{2500}';
pub const VERTICAL: char = '\u{2502}';
pub const TEE_RIGHT: char = '\u{251C}';
pub const TEE_LEFT: char = '\u{2524}';
pub const TEE_DOWN: char = '\u{252C}';
pub const TEE_UP: char = '\u{2534}';

// Double-line box drawing.
pub const DOUBLE_TOP_LEFT: char = '\u{2554}';
pub const DOUBLE_TOP_RIGHT: char = '\u{2557}';
pub const DOUBLE_BOTTOM_LEFT: char = '\u{255A}';
pub const DOUBLE_BOTTOM_RIGHT: char = '\u{255D}';
pub const DOUBLE_HORIZONTAL: char = '\u{2550}';
pub const DOUBLE_VERTICAL: char = '\u{2551}';
pub const DOUBLE_TEE_RIGHT: char = '\u{2560}';
pub const DOUBLE_TEE_LEFT: char = '\u{2563}';
pub const DOUBLE_TEE_DOWN: char = '\u{2566}';
pub const DOUBLE_TEE_UP: char = '\u{2569}';

/// Diagonal cross.
pub const CROSS: char = '\u{2573}';

// Arrowheads.
pub const ARROW_UP: char = '\u{25B2}';
pub const ARROW_DOWN: char = '\u{25BC}';
pub const ARROW_LEFT: char = '\u{25C4}';
pub const ARROW_RIGHT: char = '\u{25BA}';
