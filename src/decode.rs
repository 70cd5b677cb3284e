//! Raw grayscale frame extraction from the input video.
//!
//! ffmpeg decodes the source to 8-bit grayscale rawvideo on stdout and the
//! [`FrameSource`] yields fixed-size frames from that pipe. Grayscale
//! conversion happens inside ffmpeg (`-pix_fmt gray`), so every frame
//! arrives as exactly `width * height` bytes.

use std::io::{self, BufReader, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::Duration;

/// One decoded grayscale frame, row-major, one byte per pixel.
/// Lives only for the duration of processing that frame.
#[derive(Debug, Clone)]
pub struct GrayFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Streaming frame source backed by an ffmpeg child process.
///
/// The child is released on every exit path: explicitly via [`close`],
/// or by `Drop` when the pipeline unwinds.
///
/// [`close`]: FrameSource::close
pub struct FrameSource {
    child: Child,
    stdout: BufReader<ChildStdout>,
    width: u32,
    height: u32,
    frame_len: usize,
    finished: bool,
}

impl FrameSource {
    /// Spawn the decoder for `path`, producing frames of `width * height`
    /// grayscale bytes.
    pub fn open(path: &Path, width: u32, height: u32) -> io::Result<Self> {
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "gray", "-an", "-sn", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "decoder stdout missing"))?;

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            width,
            height,
            frame_len: (width as usize) * (height as usize),
            finished: false,
        })
    }

    /// Read the next frame; `None` at end of stream.
    ///
    /// A truncated final frame (decoder killed mid-frame) counts as end of
    /// stream rather than an error.
    pub fn next_frame(&mut self) -> io::Result<Option<GrayFrame>> {
        if self.finished {
            return Ok(None);
        }

        let mut data = vec![0u8; self.frame_len];
        match self.stdout.read_exact(&mut data) {
            Ok(()) => Ok(Some(GrayFrame {
                width: self.width,
                height: self.height,
                data,
            })),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Stop decoding and reap the child process.
    pub fn close(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            // Ask nicely first so ffmpeg can tear down its demuxer
            #[cfg(unix)]
            unsafe {
                libc::kill(self.child.id() as i32, libc::SIGINT);
            }
            #[cfg(not(unix))]
            {
                let _ = self.child.kill();
            }

            std::thread::sleep(Duration::from_millis(50));
            if matches!(self.child.try_wait(), Ok(None)) {
                let _ = self.child.kill();
            }
        }
        let _ = self.child.wait();
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.close();
    }
}
