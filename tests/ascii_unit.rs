//! Unit tests for the ASCII conversion pipeline:
//! - Grid shape derivation
//! - Area-averaging downsampling
//! - Glyph mapping
//! - Full frame-to-grid conversion

use glyphcast::ascii::{
    downsample, frame_to_grid, glyph_for, grid_shape, map_to_glyphs, parse_ramp, DEFAULT_RAMP,
    DEFAULT_SCALE,
};

// ==================== Ramp Tests ====================

#[test]
fn test_default_ramp_has_13_levels() {
    assert_eq!(DEFAULT_RAMP.len(), 13);
    assert_eq!(DEFAULT_RAMP[0], ' '); // darkest
    assert_eq!(DEFAULT_RAMP[12], '|'); // brightest
}

#[test]
fn test_parse_ramp_accepts_ascii() {
    assert_eq!(parse_ramp(" .#").unwrap(), vec![' ', '.', '#']);
}

#[test]
fn test_parse_ramp_rejects_empty() {
    assert!(parse_ramp("").is_err());
}

#[test]
fn test_parse_ramp_rejects_non_ascii() {
    assert!(parse_ramp(" .█").is_err());
}

// ==================== Grid Shape Tests ====================

#[test]
fn test_grid_shape_64x36_at_40_columns() {
    // tile_w = 64/40 = 1.6; tile_h = 1.6/0.43 = 3.7209...
    // rows = floor(36 / 3.7209) = floor(9.675) = 9
    let (cols, rows) = grid_shape(64, 36, 40, DEFAULT_SCALE);
    assert_eq!(cols, 40);
    assert_eq!(rows, 9);
}

#[test]
fn test_grid_shape_floors_rows_to_one() {
    // A 2-pixel-tall frame: 2 / 3.7209 = 0.53 -> floor 0 -> clamp 1
    let (cols, rows) = grid_shape(64, 2, 40, DEFAULT_SCALE);
    assert_eq!(cols, 40);
    assert_eq!(rows, 1);
}

#[test]
fn test_grid_shape_clamps_columns_to_one() {
    let (cols, rows) = grid_shape(64, 36, 0, DEFAULT_SCALE);
    assert_eq!(cols, 1);
    assert!(rows >= 1);
}

#[test]
fn test_grid_shape_matches_formula() {
    // rows = max(1, floor(H / ((W/C) / S))) for a spread of inputs
    let cases = [
        (1920u32, 1080u32, 120u32, 0.43f32),
        (640, 480, 80, 0.43),
        (640, 480, 80, 1.0),
        (100, 100, 10, 0.5),
        (64, 36, 40, 0.43),
        (320, 240, 1, 0.43),
    ];
    for (w, h, c, s) in cases {
        let expected_rows = ((h as f32) / ((w as f32 / c as f32) / s)).floor().max(1.0) as u32;
        let (cols, rows) = grid_shape(w, h, c, s);
        assert_eq!(cols, c, "columns for {}x{} c={} s={}", w, h, c, s);
        assert_eq!(rows, expected_rows, "rows for {}x{} c={} s={}", w, h, c, s);
    }
}

#[test]
fn test_grid_shape_deterministic() {
    assert_eq!(
        grid_shape(1280, 720, 120, DEFAULT_SCALE),
        grid_shape(1280, 720, 120, DEFAULT_SCALE)
    );
}

// ==================== Downsampling Tests ====================

#[test]
fn test_downsample_1to1() {
    let result = downsample(&[128], 1, 1, 1, 1);
    assert_eq!(result, vec![128]);
}

#[test]
fn test_downsample_4x4_to_2x2_averages() {
    #[rustfmt::skip]
    let gray = vec![
        10, 20,  30, 40,
        50, 60,  70, 80,
        90, 100, 110, 120,
        130, 140, 150, 160,
    ];
    let result = downsample(&gray, 4, 4, 2, 2);
    // Top-left 2x2: (10+20+50+60)/4 = 35
    // Top-right 2x2: (30+40+70+80)/4 = 55
    // Bottom-left 2x2: (90+100+130+140)/4 = 115
    // Bottom-right 2x2: (110+120+150+160)/4 = 135
    assert_eq!(result, vec![35, 55, 115, 135]);
}

#[test]
fn test_downsample_uniform_image() {
    let gray = vec![128; 64 * 36];
    let result = downsample(&gray, 64, 36, 40, 9);
    assert_eq!(result.len(), 40 * 9);
    assert!(result.iter().all(|&v| v == 128));
}

#[test]
fn test_downsample_horizontal_gradient() {
    #[rustfmt::skip]
    let gray = vec![
        0, 0, 255, 255,
        0, 0, 255, 255,
    ];
    let result = downsample(&gray, 4, 2, 2, 1);
    assert_eq!(result, vec![0, 255]);
}

#[test]
fn test_downsample_zero_coverage_cells_are_black() {
    // More columns than pixels: every other cell covers no source pixel
    let gray = vec![200; 4]; // 2x2
    let result = downsample(&gray, 2, 2, 4, 1);
    assert_eq!(result, vec![0, 200, 0, 200]);
}

#[test]
fn test_downsample_zero_output_is_empty() {
    let gray = vec![128; 4];
    assert!(downsample(&gray, 2, 2, 0, 1).is_empty());
    assert!(downsample(&gray, 2, 2, 1, 0).is_empty());
}

// ==================== Glyph Mapping Tests ====================

#[test]
fn test_glyph_endpoints() {
    assert_eq!(glyph_for(0, DEFAULT_RAMP), DEFAULT_RAMP[0]);
    assert_eq!(glyph_for(255, DEFAULT_RAMP), DEFAULT_RAMP[12]);
}

#[test]
fn test_glyph_mapping_is_total() {
    for v in 0..=255u8 {
        let glyph = glyph_for(v, DEFAULT_RAMP);
        assert!(DEFAULT_RAMP.contains(&glyph), "brightness {} unmapped", v);
    }
}

#[test]
fn test_glyph_mapping_is_monotonic() {
    // Non-decreasing ramp index as brightness rises
    let mut prev_idx = 0;
    for v in 0..=255u8 {
        let glyph = glyph_for(v, DEFAULT_RAMP);
        let idx = DEFAULT_RAMP.iter().position(|&g| g == glyph).unwrap();
        assert!(idx >= prev_idx, "index decreased at brightness {}", v);
        prev_idx = idx;
    }
}

#[test]
fn test_glyph_index_math() {
    // 3-glyph ramp, index = (v * 2) / 255
    let ramp = &['.', 'o', 'O'];
    assert_eq!(glyph_for(0, ramp), '.'); // (0*2)/255 = 0
    assert_eq!(glyph_for(127, ramp), '.'); // (127*2)/255 = 0
    assert_eq!(glyph_for(128, ramp), 'o'); // (128*2)/255 = 1
    assert_eq!(glyph_for(255, ramp), 'O'); // (255*2)/255 = 2
}

#[test]
fn test_map_to_glyphs_invert() {
    let glyphs = map_to_glyphs(&[0, 255], DEFAULT_RAMP, true);
    assert_eq!(glyphs[0], DEFAULT_RAMP[12]); // 255-0 -> brightest
    assert_eq!(glyphs[1], DEFAULT_RAMP[0]); // 255-255 -> darkest
}

#[test]
fn test_map_to_glyphs_empty_ramp_yields_spaces() {
    let glyphs = map_to_glyphs(&[0, 127, 255], &[], false);
    assert_eq!(glyphs, vec![' ', ' ', ' ']);
}

// ==================== Frame Conversion Tests ====================

#[test]
fn test_frame_to_grid_shape_and_content() {
    let gray = vec![128; 64 * 36];
    let grid = frame_to_grid(&gray, 64, 36, 40, DEFAULT_SCALE, DEFAULT_RAMP, false);
    assert_eq!(grid.cols(), 40);
    assert_eq!(grid.rows(), 9);
    // Uniform input maps to one glyph: (128 * 12) / 255 = 6 -> '*'
    assert!(grid.cells().iter().all(|&c| c == '*'));
}

#[test]
fn test_frame_to_grid_deterministic() {
    let gray: Vec<u8> = (0..64 * 36).map(|i| (i % 251) as u8).collect();
    let a = frame_to_grid(&gray, 64, 36, 40, DEFAULT_SCALE, DEFAULT_RAMP, false);
    let b = frame_to_grid(&gray, 64, 36, 40, DEFAULT_SCALE, DEFAULT_RAMP, false);
    assert_eq!(a, b);
}

#[test]
fn test_frame_to_grid_rows_have_equal_length() {
    let gray = vec![90; 100 * 50];
    let grid = frame_to_grid(&gray, 100, 50, 33, DEFAULT_SCALE, DEFAULT_RAMP, false);
    let lines = grid.to_lines();
    assert_eq!(lines.len(), grid.rows() as usize);
    assert!(lines.iter().all(|l| l.chars().count() == 33));
}
