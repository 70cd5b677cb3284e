//! Glyph ramp definitions for brightness quantization.

/// Default glyph ramp (13 levels).
/// Characters ordered from darkest (space) to brightest.
pub const DEFAULT_RAMP: &[char] = &[
    ' ', '.', ':', '-', '=', '+', '*', '#', '%', '@', '/', '\\', '|',
];

/// Parse a user-supplied ramp string, ordered dark to light.
///
/// The ramp must be non-empty and pure ASCII; anything wider than one
/// terminal cell would break the grid's row alignment.
pub fn parse_ramp(s: &str) -> Result<Vec<char>, String> {
    if s.is_empty() {
        return Err("glyph ramp must not be empty".to_string());
    }
    if !s.is_ascii() {
        return Err("glyph ramp must contain only ASCII characters".to_string());
    }
    Ok(s.chars().collect())
}
