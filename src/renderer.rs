//! File-mode frame rendering: glyph grids to fixed-size raster images.
//!
//! Video encoders require every frame of a stream to share exact pixel
//! dimensions. The canvas size is therefore a pure function of the grid
//! shape and the render style, and mismatched frames are letterboxed into
//! the established canvas rather than stretched.

use ab_glyph::{FontArc, PxScale};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;

use crate::ascii::GlyphGrid;
use crate::config::RenderConfig;
use crate::font::CellMetrics;

/// Everything the rasterizer needs besides the grid itself.
///
/// Built once per run from the resolved font and the immutable render
/// configuration; never mutated afterwards.
pub struct FrameStyle {
    font: FontArc,
    cell: CellMetrics,
    font_px: f32,
    padding: u32,
    fg: Rgb<u8>,
    bg: Rgb<u8>,
}

impl FrameStyle {
    pub fn new(font: FontArc, config: &RenderConfig) -> Self {
        let cell = CellMetrics::measure(&font, config.font_px);
        Self {
            font,
            cell,
            font_px: config.font_px,
            padding: config.padding,
            fg: Rgb(config.fg),
            bg: Rgb(config.bg),
        }
    }

    pub fn cell(&self) -> CellMetrics {
        self.cell
    }

    pub fn background(&self) -> Rgb<u8> {
        self.bg
    }

    /// Canvas size for a grid of the given shape under this style.
    pub fn canvas_size(&self, cols: u32, rows: u32) -> (u32, u32) {
        canvas_size(cols, rows, self.cell, self.padding)
    }
}

/// Canvas pixel size for a glyph grid shape.
///
/// Both dimensions are rounded up to the next even number; common encoders
/// (yuv420p in particular) reject odd frame sizes.
pub fn canvas_size(cols: u32, rows: u32, cell: CellMetrics, padding: u32) -> (u32, u32) {
    let w = cell.width * cols + padding * 2;
    let h = cell.height * rows + padding * 2;
    (round_up_even(w), round_up_even(h))
}

fn round_up_even(v: u32) -> u32 {
    if v % 2 == 0 {
        v
    } else {
        v + 1
    }
}

/// Rasterize a glyph grid into an image.
///
/// For a fixed style and grid shape every call produces an image of
/// identical pixel size; the save-mode canvas contract depends on this.
pub fn rasterize(grid: &GlyphGrid, style: &FrameStyle) -> RgbImage {
    let (width, height) = style.canvas_size(grid.cols(), grid.rows());
    let mut canvas = RgbImage::from_pixel(width, height, style.bg);

    let scale = PxScale::from(style.font_px);
    let mut line = String::with_capacity(grid.cols() as usize);
    for (row_idx, row) in grid.rows_iter().enumerate() {
        line.clear();
        line.extend(row.iter());
        let y = style.padding + row_idx as u32 * style.cell.height;
        draw_text_mut(
            &mut canvas,
            style.fg,
            style.padding as i32,
            y as i32,
            scale,
            &style.font,
            &line,
        );
    }

    canvas
}

/// Letterbox a frame into a canvas of exactly `(target_w, target_h)`.
///
/// The frame is scaled uniformly to fit (never stretched), centered, and
/// padded with the background color. A frame already at the target size
/// passes through untouched.
pub fn fit_to_canvas(frame: RgbImage, target_w: u32, target_h: u32, bg: Rgb<u8>) -> RgbImage {
    let (w, h) = frame.dimensions();
    if (w, h) == (target_w, target_h) {
        return frame;
    }

    let mut scale = (target_w as f32 / w as f32).min(target_h as f32 / h as f32);
    if !scale.is_finite() || scale <= 0.0 {
        scale = 1.0;
    }

    let new_w = ((w as f32 * scale) as u32).clamp(1, target_w);
    let new_h = ((h as f32 * scale) as u32).clamp(1, target_h);

    let resized = if (new_w, new_h) != (w, h) {
        imageops::resize(&frame, new_w, new_h, FilterType::Triangle)
    } else {
        frame
    };

    let mut canvas = RgbImage::from_pixel(target_w, target_h, bg);
    let x = (target_w - new_w) / 2;
    let y = (target_h - new_h) / 2;
    imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
    canvas
}
