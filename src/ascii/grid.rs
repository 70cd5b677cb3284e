//! Row-major glyph grid produced from one video frame.

/// A rectangular grid of glyphs.
///
/// Invariant: `cells.len() == cols * rows` and every row has exactly
/// `cols` glyphs. The shape is constant across all frames of one run,
/// which the file-output canvas contract depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphGrid {
    cols: u32,
    rows: u32,
    cells: Vec<char>,
}

impl GlyphGrid {
    /// Build a grid from row-major cells.
    pub fn new(cols: u32, rows: u32, cells: Vec<char>) -> Self {
        assert_eq!(
            cells.len(),
            (cols as usize) * (rows as usize),
            "glyph grid cells must match cols * rows"
        );
        Self { cols, rows, cells }
    }

    /// Grid width in glyphs.
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Grid height in glyphs.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// All cells, row-major.
    pub fn cells(&self) -> &[char] {
        &self.cells
    }

    /// Iterate over rows as glyph slices.
    pub fn rows_iter(&self) -> impl Iterator<Item = &[char]> {
        self.cells.chunks(self.cols.max(1) as usize)
    }

    /// Render the grid as terminal lines, one `String` per row.
    pub fn to_lines(&self) -> Vec<String> {
        self.rows_iter().map(|row| row.iter().collect()).collect()
    }
}
