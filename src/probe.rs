//! Input stream metadata via ffprobe.

use std::path::Path;
use std::process::Command;

use thiserror::Error;

/// Geometry and declared frame rate of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    /// Frames per second; 0.0 when the container does not declare a rate.
    pub fps: f64,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("ffprobe not found on PATH; install ffmpeg to read video files")]
    ToolMissing,
    #[error("ffprobe failed: {detail}")]
    Failed { detail: String },
    #[error("unexpected ffprobe output: '{line}'")]
    Malformed { line: String },
    #[error("i/o error running ffprobe: {0}")]
    Io(std::io::Error),
}

/// Probe the first video stream of `path`.
pub fn probe(path: &Path) -> Result<StreamInfo, ProbeError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProbeError::ToolMissing
            } else {
                ProbeError::Io(e)
            }
        })?;

    if !output.status.success() {
        return Err(ProbeError::Failed {
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    parse_probe_line(&String::from_utf8_lossy(&output.stdout))
}

/// Parse a `width,height,num/den` line as printed by ffprobe's csv writer.
fn parse_probe_line(raw: &str) -> Result<StreamInfo, ProbeError> {
    let line = raw.trim();
    let malformed = || ProbeError::Malformed {
        line: line.to_string(),
    };

    let mut parts = line.split(',');
    let width: u32 = parts
        .next()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(malformed)?;
    let height: u32 = parts
        .next()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(malformed)?;
    if width == 0 || height == 0 {
        return Err(malformed());
    }
    let fps = parts.next().map(parse_rate).unwrap_or(0.0);

    Ok(StreamInfo { width, height, fps })
}

/// Parse a frame rate such as `30000/1001`, `25/1` or `24`.
///
/// Undefined rates (`0/0`, garbage) come back as 0.0 so the caller can
/// fall through to its default.
fn parse_rate(s: &str) -> f64 {
    match s.trim().split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().unwrap_or(0.0);
            let den: f64 = den.trim().parse().unwrap_or(0.0);
            if den > 0.0 && num > 0.0 {
                num / den
            } else {
                0.0
            }
        }
        None => s.trim().parse::<f64>().unwrap_or(0.0).max(0.0),
    }
}
