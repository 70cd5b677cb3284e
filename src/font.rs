//! Font resolution and glyph cell metrics for file-mode rendering.
//!
//! The renderer never touches filesystem paths itself: a [`FontResolver`]
//! turns an ordered candidate list into a font handle, and the rasterizer
//! consumes only that handle plus the measured [`CellMetrics`].

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use thiserror::Error;

/// Cell size used when font measurement yields a non-positive dimension.
pub const MIN_CELL: (u32, u32) = (8, 16);

/// Errors from font resolution.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("no usable font found in {tried} candidate locations; pass --font <path>")]
    NotFound { tried: usize },
    #[error("failed to read font '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("'{}' is not a valid font file", path.display())]
    Invalid { path: PathBuf },
}

/// Resolves a concrete font from an ordered candidate list.
pub struct FontResolver {
    candidates: Vec<PathBuf>,
}

impl FontResolver {
    /// Resolver over the platform's usual monospace font locations.
    pub fn system() -> Self {
        Self {
            candidates: system_candidates(),
        }
    }

    /// Resolver that tries `preferred` first, then the platform locations.
    pub fn with_preferred(preferred: Option<&Path>) -> Self {
        let mut candidates = Vec::new();
        if let Some(p) = preferred {
            candidates.push(p.to_path_buf());
        }
        candidates.extend(system_candidates());
        Self { candidates }
    }

    /// Load the first candidate that exists on disk.
    ///
    /// An existing but unreadable or unparsable candidate is an error, not
    /// a skip; silently falling past a corrupt font would hide the problem.
    pub fn resolve(&self) -> Result<FontArc, FontError> {
        for path in &self.candidates {
            if !path.exists() {
                continue;
            }
            let bytes = fs::read(path).map_err(|source| FontError::Unreadable {
                path: path.clone(),
                source,
            })?;
            return FontArc::try_from_vec(bytes).map_err(|_| FontError::Invalid {
                path: path.clone(),
            });
        }
        Err(FontError::NotFound {
            tried: self.candidates.len(),
        })
    }
}

fn system_candidates() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
        "/Library/Fonts/Courier New.ttf",
        "C:\\Windows\\Fonts\\consola.ttf",
        "C:\\Windows\\Fonts\\lucon.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

/// Pixel dimensions of one glyph cell under a given font and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub width: u32,
    pub height: u32,
}

impl CellMetrics {
    /// Measure the cell from the advance of `M` (typically the widest
    /// glyph in a monospace face) and the scaled line height.
    pub fn measure(font: &FontArc, px: f32) -> Self {
        let scaled = font.as_scaled(PxScale::from(px));
        let width = scaled.h_advance(scaled.glyph_id('M')).ceil() as i64;
        let height = scaled.height().ceil() as i64;
        Self::clamped(width, height)
    }

    /// Clamp non-positive measurements to [`MIN_CELL`].
    pub fn clamped(width: i64, height: i64) -> Self {
        Self {
            width: if width > 0 { width as u32 } else { MIN_CELL.0 },
            height: if height > 0 { height as u32 } else { MIN_CELL.1 },
        }
    }
}
