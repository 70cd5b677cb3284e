//! Grid shape derivation for aspect-corrected sampling.

/// Default aspect-correction scale factor.
///
/// Rendered glyphs are taller than they are wide, so sampling tiles are
/// stretched vertically by `1/scale` to keep the output proportioned like
/// the source.
pub const DEFAULT_SCALE: f32 = 0.43;

/// Compute the glyph grid shape for a source frame.
///
/// Each column covers `width / columns` source pixels; each row covers
/// `tile_w / scale` pixels vertically. The row count floors to at least 1
/// so a very wide or very short frame still produces output.
///
/// # Returns
/// `(cols, rows)` of the glyph grid.
pub fn grid_shape(width: u32, height: u32, columns: u32, scale: f32) -> (u32, u32) {
    let columns = columns.max(1);
    let tile_w = width as f32 / columns as f32;
    let tile_h = tile_w / scale;

    let rows = if tile_h.is_finite() && tile_h > 0.0 {
        (height as f32 / tile_h).floor() as u32
    } else {
        0
    };

    (columns, rows.max(1))
}
