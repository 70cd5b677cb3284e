//! Audio remux collaborator.
//!
//! Merges the original source's audio into the rendered (silent) video by
//! invoking ffmpeg with the video stream copied untouched. A missing tool
//! or a failed merge never invalidates the primary output file; callers
//! surface both as warnings.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemuxError {
    #[error("ffmpeg not found on PATH; audio merge skipped")]
    Unavailable,
    #[error("audio merge failed: {detail}")]
    Failed { detail: String },
}

/// Output path for the merged file: `<stem>_with_audio.mp4`.
pub fn merged_output_path(video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("ascii_out");
    video.with_file_name(format!("{}_with_audio.mp4", stem))
}

/// The exact ffmpeg invocation: copy video from `video`, take audio from
/// `source`, trim to the shorter stream.
pub fn merge_args(video: &Path, source: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-v".into(), "error".into()];
    args.push("-i".into());
    args.push(video.into());
    args.push("-i".into());
    args.push(source.into());
    for fixed in ["-c:v", "copy", "-map", "0:v:0", "-map", "1:a:0", "-shortest"] {
        args.push(fixed.into());
    }
    args.push(output.into());
    args
}

/// Merge the audio of `source` into `video`. Returns the merged file path.
pub fn merge_audio(video: &Path, source: &Path) -> Result<PathBuf, RemuxError> {
    merge_audio_with_tool("ffmpeg", video, source)
}

/// [`merge_audio`] with an explicit muxer binary, so the missing-tool path
/// is reachable from tests.
pub fn merge_audio_with_tool(
    tool: &str,
    video: &Path,
    source: &Path,
) -> Result<PathBuf, RemuxError> {
    let output = merged_output_path(video);
    let result = Command::new(tool)
        .args(merge_args(video, source, &output))
        .output();

    match result {
        Err(e) if e.kind() == ErrorKind::NotFound => Err(RemuxError::Unavailable),
        Err(e) => Err(RemuxError::Failed {
            detail: e.to_string(),
        }),
        Ok(out) if !out.status.success() => Err(RemuxError::Failed {
            detail: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        }),
        Ok(_) => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_path_appends_suffix() {
        assert_eq!(
            merged_output_path(Path::new("clips/out.mp4")),
            Path::new("clips/out_with_audio.mp4")
        );
        assert_eq!(
            merged_output_path(Path::new("out.avi")),
            Path::new("out_with_audio.mp4")
        );
    }

    #[test]
    fn merge_args_copy_video_and_trim() {
        let args = merge_args(
            Path::new("silent.mp4"),
            Path::new("original.mp4"),
            Path::new("merged.mp4"),
        );
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let joined = args.join(" ");
        assert!(joined.contains("-c:v copy"));
        assert!(joined.contains("-map 0:v:0 -map 1:a:0"));
        assert!(joined.contains("-shortest"));
        // Video-only input comes first, audio donor second
        let vi = args.iter().position(|a| a == "silent.mp4").unwrap();
        let ai = args.iter().position(|a| a == "original.mp4").unwrap();
        assert!(vi < ai);
        assert_eq!(args.last().unwrap(), "merged.mp4");
    }

    #[test]
    fn missing_tool_is_unavailable_not_failed() {
        let err = merge_audio_with_tool(
            "glyphcast-no-such-muxer",
            Path::new("a.mp4"),
            Path::new("b.mp4"),
        )
        .unwrap_err();
        assert!(matches!(err, RemuxError::Unavailable));
    }
}
