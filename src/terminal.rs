//! Terminal playback output.

use std::io::{self, Write};

use crate::ascii::GlyphGrid;

/// ANSI: clear the screen and home the cursor.
const CLEAR: &str = "\x1b[2J\x1b[H";

/// Writes glyph frames to a terminal, clearing the screen before each.
///
/// Generic over the sink so tests can present into a buffer.
pub struct TerminalPresenter<W: Write> {
    out: W,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Emit one frame: full-screen clear, then the grid rows as lines.
    ///
    /// The frame is assembled into one buffer and written with a single
    /// syscall; interleaving per-line writes tears visibly at speed.
    pub fn present(&mut self, grid: &GlyphGrid) -> io::Result<()> {
        let mut text =
            String::with_capacity(CLEAR.len() + (grid.cols() as usize + 1) * grid.rows() as usize);
        text.push_str(CLEAR);
        for row in grid.rows_iter() {
            text.extend(row.iter());
            text.push('\n');
        }
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }
}
