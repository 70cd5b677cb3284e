//! Output video writer backed by an ffmpeg encoder process.
//!
//! The writer owns an ffmpeg child consuming raw RGB frames on stdin. It is
//! created lazily by the pipeline once the first rendered frame has fixed
//! the canvas size, and it is released exactly once: by [`finish`] on the
//! normal path, or by `Drop` on any abort path.
//!
//! [`finish`]: VideoWriter::finish

use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use image::RgbImage;
use thiserror::Error;

/// An encoder container/codec combination the writer can try.
#[derive(Debug, Clone, Copy)]
pub struct EncoderProfile {
    pub name: &'static str,
    pub extension: &'static str,
    pub codec_args: &'static [&'static str],
}

/// Primary profile: H.264 in MP4.
pub const PRIMARY_PROFILE: EncoderProfile = EncoderProfile {
    name: "h264/mp4",
    extension: "mp4",
    codec_args: &[
        "-c:v",
        "libx264",
        "-preset",
        "medium",
        "-crf",
        "18",
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
    ],
};

/// Fallback profile: MJPEG in AVI, present in effectively every ffmpeg build.
pub const FALLBACK_PROFILE: EncoderProfile = EncoderProfile {
    name: "mjpeg/avi",
    extension: "avi",
    codec_args: &["-c:v", "mjpeg", "-q:v", "3"],
};

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("ffmpeg not found on PATH; install ffmpeg to enable save mode")]
    FfmpegNotFound,
    #[error("encoder {profile} failed to start: {detail}")]
    OpenFailed {
        profile: &'static str,
        detail: String,
    },
    #[error("encoder exited with an error: {detail}")]
    EncodeFailed { detail: String },
    #[error("i/o error talking to the encoder: {0}")]
    Io(#[from] io::Error),
}

/// Result of the two-attempt open policy in [`open_with_fallback`].
#[derive(Debug)]
pub enum WriterOpen<W> {
    /// An encoder is running; `path` is where the stream actually lands
    /// (the fallback renames the output to its own extension).
    Opened { writer: W, path: PathBuf },
    /// Neither profile could be opened.
    Failed { reason: String },
}

/// Try the primary profile at `path`, then the fallback profile at the
/// same path with the fallback's extension.
///
/// Generic over the opener so the branch structure is testable without an
/// encoder on the machine.
pub fn open_with_fallback<W, E, F>(path: &Path, mut open: F) -> WriterOpen<W>
where
    E: std::fmt::Display,
    F: FnMut(&EncoderProfile, &Path) -> Result<W, E>,
{
    match open(&PRIMARY_PROFILE, path) {
        Ok(writer) => WriterOpen::Opened {
            writer,
            path: path.to_path_buf(),
        },
        Err(primary_err) => {
            let alt_path = path.with_extension(FALLBACK_PROFILE.extension);
            log::warn!(
                "encoder {} failed to open ({}); retrying with {} at {}",
                PRIMARY_PROFILE.name,
                primary_err,
                FALLBACK_PROFILE.name,
                alt_path.display()
            );
            match open(&FALLBACK_PROFILE, &alt_path) {
                Ok(writer) => WriterOpen::Opened {
                    writer,
                    path: alt_path,
                },
                Err(fallback_err) => WriterOpen::Failed {
                    reason: format!(
                        "{}: {}; {}: {}",
                        PRIMARY_PROFILE.name, primary_err, FALLBACK_PROFILE.name, fallback_err
                    ),
                },
            }
        }
    }
}

/// A live encoder accepting raw RGB frames of one fixed size on stdin.
pub struct VideoWriter {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_thread: Option<JoinHandle<Vec<String>>>,
    width: u32,
    height: u32,
    path: PathBuf,
}

impl VideoWriter {
    /// Spawn an encoder writing `width`x`height` frames at `fps` to `path`.
    ///
    /// ffmpeg validates its arguments up front, so a rejected encoder or
    /// container exits within milliseconds; an already-dead child after the
    /// grace period is reported as an open failure rather than surfacing
    /// later as a broken pipe.
    pub fn open(
        path: &Path,
        profile: &EncoderProfile,
        width: u32,
        height: u32,
        fps: f64,
    ) -> Result<Self, WriterError> {
        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-v", "error", "-y"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .arg("-s:v")
            .arg(format!("{}x{}", width, height))
            .arg("-r")
            .arg(format!("{:.4}", fps))
            .args(["-i", "-", "-an"])
            .args(profile.codec_args)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    WriterError::FfmpegNotFound
                } else {
                    WriterError::OpenFailed {
                        profile: profile.name,
                        detail: e.to_string(),
                    }
                }
            })?;

        let stdin = child.stdin.take();
        let stderr_thread = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                let reader = BufReader::new(stderr);
                let mut lines = Vec::new();
                for line in reader.lines().map_while(Result::ok) {
                    log::debug!("[ffmpeg] {}", line);
                    lines.push(line);
                }
                lines
            })
        });

        thread::sleep(Duration::from_millis(80));
        if let Ok(Some(status)) = child.try_wait() {
            let stderr = stderr_thread
                .and_then(|h| h.join().ok())
                .unwrap_or_default()
                .join("; ");
            let detail = if stderr.is_empty() {
                format!("exited immediately with {}", status)
            } else {
                stderr
            };
            return Err(WriterError::OpenFailed {
                profile: profile.name,
                detail,
            });
        }

        Ok(Self {
            child,
            stdin,
            stderr_thread,
            width,
            height,
            path: path.to_path_buf(),
        })
    }

    /// The canvas size every written frame must match.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one frame. The frame must already conform to the canvas size.
    pub fn write_frame(&mut self, frame: &RgbImage) -> io::Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "frame is {}x{}, writer expects {}x{}",
                    frame.width(),
                    frame.height(),
                    self.width,
                    self.height
                ),
            ));
        }
        match self.stdin.as_mut() {
            Some(stdin) => stdin.write_all(frame.as_raw()),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "encoder stdin already closed",
            )),
        }
    }

    /// Close the frame pipe, wait for the encoder to flush, and verify its
    /// exit status. Returns the path the stream was written to.
    pub fn finish(mut self) -> Result<PathBuf, WriterError> {
        self.stdin.take();
        let status = self.child.wait()?;
        let stderr = self
            .stderr_thread
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        if status.success() {
            Ok(self.path.clone())
        } else {
            Err(WriterError::EncodeFailed {
                detail: if stderr.is_empty() {
                    status.to_string()
                } else {
                    stderr.join("\n")
                },
            })
        }
    }
}

impl Drop for VideoWriter {
    fn drop(&mut self) {
        // Closing stdin lets ffmpeg flush whatever it already received;
        // a child still running after the grace period is killed.
        self.stdin.take();
        if matches!(self.child.try_wait(), Ok(None)) {
            thread::sleep(Duration::from_millis(200));
            if matches!(self.child.try_wait(), Ok(None)) {
                let _ = self.child.kill();
            }
        }
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn fallback_policy_keeps_primary_path_on_success() {
        let result = open_with_fallback(Path::new("out.mp4"), |profile, path| {
            assert_eq!(profile.name, PRIMARY_PROFILE.name);
            Ok::<_, String>(path.to_path_buf())
        });
        match result {
            WriterOpen::Opened { path, .. } => assert_eq!(path, Path::new("out.mp4")),
            WriterOpen::Failed { reason } => panic!("unexpected failure: {}", reason),
        }
    }

    #[test]
    fn fallback_policy_renames_output_extension() {
        let mut attempts = Vec::new();
        let result = open_with_fallback(Path::new("clips/out.mp4"), |profile, path| {
            attempts.push(profile.name);
            if profile.name == PRIMARY_PROFILE.name {
                Err("no h264".to_string())
            } else {
                Ok(path.to_path_buf())
            }
        });
        assert_eq!(attempts, vec![PRIMARY_PROFILE.name, FALLBACK_PROFILE.name]);
        match result {
            WriterOpen::Opened { path, .. } => assert_eq!(path, Path::new("clips/out.avi")),
            WriterOpen::Failed { reason } => panic!("unexpected failure: {}", reason),
        }
    }

    #[test]
    fn fallback_policy_reports_both_failures() {
        let result = open_with_fallback(Path::new("out.mp4"), |profile, _| {
            Err::<PathBuf, _>(format!("{} rejected", profile.name))
        });
        match result {
            WriterOpen::Opened { .. } => panic!("should not open"),
            WriterOpen::Failed { reason } => {
                assert!(reason.contains(PRIMARY_PROFILE.name));
                assert!(reason.contains(FALLBACK_PROFILE.name));
            }
        }
    }
}
