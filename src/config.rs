//! Run configuration.
//!
//! [`RenderConfig`] is the immutable per-run settings block: the control
//! surface builds it once (defaults, then the optional TOML file, then CLI
//! overrides) and hands it to the pipeline, which never mutates it.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::ascii::{charset, DEFAULT_SCALE};

/// Immutable settings for one conversion run.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Glyph grid width in characters (>= 1).
    pub columns: u32,
    /// Aspect-correction scale factor (> 0).
    pub scale: f32,
    /// Font size in pixels for file-mode rendering.
    pub font_px: f32,
    /// Canvas padding in pixels around the glyph block.
    pub padding: u32,
    /// Foreground (glyph) color.
    pub fg: [u8; 3],
    /// Background color, also used for letterbox margins.
    pub bg: [u8; 3],
    /// Target frame rate; 0 means "use the source's rate".
    pub fps: f64,
    /// Glyph ramp, dark to light.
    pub ramp: Vec<char>,
    /// Invert brightness before mapping (light terminal themes).
    pub invert: bool,
    /// Preferred font file, tried before the platform candidates.
    pub font_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            columns: 120,
            scale: DEFAULT_SCALE,
            font_px: 12.0,
            padding: 6,
            fg: [255, 255, 255],
            bg: [0, 0, 0],
            fps: 0.0,
            ramp: charset::DEFAULT_RAMP.to_vec(),
            invert: false,
            font_path: None,
        }
    }
}

/// Configuration file structure.
/// Loaded from `~/.config/glyphcast/config.toml` (or a custom path).
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub playback: PlaybackSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Deserialize, Default)]
pub struct RenderSection {
    pub columns: Option<u32>,
    pub scale: Option<f32>,
    #[serde(rename = "font-size")]
    pub font_size: Option<f32>,
    pub padding: Option<u32>,
    pub ramp: Option<String>,
    pub invert: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PlaybackSection {
    pub fps: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct OutputSection {
    pub font: Option<PathBuf>,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl FileConfig {
    /// Load configuration from `path`, or the default location when `None`.
    /// A missing file yields the empty config; a file that exists but does
    /// not parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })
        } else {
            Ok(FileConfig::default())
        }
    }

    /// Fold the file's values into a [`RenderConfig`].
    pub fn apply(&self, mut config: RenderConfig) -> Result<RenderConfig, ConfigError> {
        if let Some(columns) = self.render.columns {
            config.columns = columns.max(1);
        }
        if let Some(scale) = self.render.scale {
            if scale <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "render.scale must be positive, got {}",
                    scale
                )));
            }
            config.scale = scale;
        }
        if let Some(px) = self.render.font_size {
            config.font_px = px;
        }
        if let Some(padding) = self.render.padding {
            config.padding = padding;
        }
        if let Some(ref ramp) = self.render.ramp {
            config.ramp = charset::parse_ramp(ramp).map_err(ConfigError::Invalid)?;
        }
        if let Some(invert) = self.render.invert {
            config.invert = invert;
        }
        if let Some(fps) = self.playback.fps {
            if fps < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "playback.fps must not be negative, got {}",
                    fps
                )));
            }
            config.fps = fps;
        }
        if let Some(ref font) = self.output.font {
            config.font_path = Some(font.clone());
        }
        Ok(config)
    }
}

/// Default config file path.
pub fn default_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".config/glyphcast/config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_contract() {
        let config = RenderConfig::default();
        assert_eq!(config.columns, 120);
        assert_eq!(config.fps, 0.0);
        assert_eq!(config.font_px, 12.0);
        assert_eq!(config.ramp.len(), 13);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let file = FileConfig::load(Some(Path::new("/nonexistent/glyphcast.toml"))).unwrap();
        let config = file.apply(RenderConfig::default()).unwrap();
        assert_eq!(config.columns, 120);
    }

    #[test]
    fn file_values_override_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            "[render]\ncolumns = 80\nramp = \" .#\"\ninvert = true\n\n[playback]\nfps = 30.0\n"
        )
        .unwrap();
        let file = FileConfig::load(Some(tmp.path())).unwrap();
        let config = file.apply(RenderConfig::default()).unwrap();
        assert_eq!(config.columns, 80);
        assert_eq!(config.ramp, vec![' ', '.', '#']);
        assert!(config.invert);
        assert_eq!(config.fps, 30.0);
        // Untouched values keep their defaults
        assert_eq!(config.padding, 6);
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[render\ncolumns = oops").unwrap();
        assert!(matches!(
            FileConfig::load(Some(tmp.path())),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn invalid_ramp_is_rejected() {
        let file = FileConfig {
            render: RenderSection {
                ramp: Some(String::new()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(file.apply(RenderConfig::default()).is_err());
    }

    #[test]
    fn zero_columns_clamps_to_one() {
        let file = FileConfig {
            render: RenderSection {
                columns: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        let config = file.apply(RenderConfig::default()).unwrap();
        assert_eq!(config.columns, 1);
    }
}
