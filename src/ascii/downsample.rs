//! Area-averaging downsampling from pixel frames to brightness grids.

/// Downsample a grayscale frame to a `cols` x `rows` brightness grid.
///
/// Each output cell is the mean of all source pixels covered by its tile.
/// Averaging the whole tile (rather than picking one pixel per cell) keeps
/// moving video stable; nearest-neighbour sampling flickers badly because
/// most source pixels are discarded.
///
/// # Arguments
/// * `gray` - Grayscale pixel data, one byte per pixel, row-major
/// * `width` - Source width in pixels
/// * `height` - Source height in pixels
/// * `cols` - Output grid width in cells
/// * `rows` - Output grid height in cells
///
/// # Returns
/// Brightness values (0-255), one per cell, row-major; `cols * rows` long.
/// Cells that cover no source pixels yield 0.
pub fn downsample(gray: &[u8], width: u32, height: u32, cols: u32, rows: u32) -> Vec<u8> {
    if cols == 0 || rows == 0 {
        return Vec::new();
    }

    let cell_w = width as f32 / cols as f32;
    let cell_h = height as f32 / rows as f32;

    let mut out = Vec::with_capacity((cols as usize) * (rows as usize));

    for cy in 0..rows {
        for cx in 0..cols {
            // Pixel bounds for this cell
            let start_x = (cx as f32 * cell_w) as u32;
            let end_x = (((cx + 1) as f32) * cell_w) as u32;
            let start_y = (cy as f32 * cell_h) as u32;
            let end_y = (((cy + 1) as f32) * cell_h) as u32;

            let mut sum = 0u64;
            let mut count = 0u64;

            for py in start_y..end_y.min(height) {
                for px in start_x..end_x.min(width) {
                    let idx = (py as usize) * (width as usize) + px as usize;
                    if idx < gray.len() {
                        sum += gray[idx] as u64;
                        count += 1;
                    }
                }
            }

            out.push(if count > 0 { (sum / count) as u8 } else { 0 });
        }
    }

    out
}
