//! ASCII conversion: sampling, mapping, and glyph grids.
//!
//! The per-frame path is:
//!
//! 1. **Shape** - derive the glyph grid dimensions from the source size,
//!    the requested column count and the aspect-correction scale
//! 2. **Sampling** - area-average the grayscale frame down to one
//!    brightness value per grid cell
//! 3. **Mapping** - quantize each brightness value to a glyph from a
//!    dark-to-light ramp

pub mod charset;
mod dimensions;
mod downsample;
mod grid;
mod mapping;

pub use charset::{parse_ramp, DEFAULT_RAMP};
pub use dimensions::{grid_shape, DEFAULT_SCALE};
pub use downsample::downsample;
pub use grid::GlyphGrid;
pub use mapping::{glyph_for, map_to_glyphs};

/// Convert one grayscale frame into a glyph grid.
///
/// Deterministic for a fixed (frame size, columns, scale, ramp, invert)
/// combination; the grid shape depends only on the frame size, `columns`
/// and `scale`, so every frame of one run yields the same shape.
pub fn frame_to_grid(
    gray: &[u8],
    width: u32,
    height: u32,
    columns: u32,
    scale: f32,
    ramp: &[char],
    invert: bool,
) -> GlyphGrid {
    let (cols, rows) = grid_shape(width, height, columns, scale);
    let brightness = downsample(gray, width, height, cols, rows);
    let cells = map_to_glyphs(&brightness, ramp, invert);
    GlyphGrid::new(cols, rows, cells)
}
