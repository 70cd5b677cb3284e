//! Conversion pipeline.
//!
//! Drives frame-by-frame conversion of one input video and owns the
//! lifecycle of the frame source and the output writer. One pipeline runs
//! per conversion, on its own thread; the control surface communicates
//! with it only through the [`CancelFlag`] and the [`RunEvent`] channel.
//!
//! Frame processing is strictly sequential: a frame is sampled, mapped,
//! rendered and emitted before the next is read. The only blocking
//! operations are video I/O and the pacing sleep in terminal mode.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use image::{Rgb, RgbImage};
use thiserror::Error;

use crate::ascii;
use crate::config::RenderConfig;
use crate::decode::{FrameSource, GrayFrame};
use crate::font::{FontError, FontResolver};
use crate::pacing::FramePacer;
use crate::probe;
use crate::remux;
use crate::renderer::{self, FrameStyle};
use crate::terminal::TerminalPresenter;
use crate::writer::{self, VideoWriter, WriterOpen};

/// Frame rate used when neither the caller nor the source declares one.
pub const DEFAULT_FPS: f64 = 24.0;

/// Where one run sends its frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Play in the terminal at the resolved frame rate.
    Terminal,
    /// Render into a video file.
    Save {
        output: PathBuf,
        merge_audio: bool,
    },
}

/// Everything one conversion run needs. Constructed once by the caller;
/// never mutated mid-run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub input: PathBuf,
    pub mode: OutputMode,
    pub render: RenderConfig,
}

/// Cooperative stop signal shared between the control surface and the
/// pipeline thread. Checked at every frame boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Install a Ctrl-C handler that trips `cancel`.
pub fn setup_ctrlc_handler(cancel: CancelFlag) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        cancel.cancel();
        eprintln!("\nreceived Ctrl+C, finishing up...");
    })
}

/// Notifications delivered to the control surface while a run proceeds.
#[derive(Debug)]
pub enum RunEvent {
    Started { width: u32, height: u32, fps: f64 },
    /// Frames written so far (save mode only).
    Progress { frames: u64 },
    /// Non-fatal condition; the run continues or has completed.
    Warning(String),
    Finished(RunSummary),
    Failed(PipelineError),
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// Stopped by the cancel signal; not a failure.
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub outcome: Outcome,
    /// Frames emitted (terminal) or written (save).
    pub frames: u64,
    /// The video file actually produced, if any.
    pub output: Option<PathBuf>,
    /// The audio-merged file, when remux was requested and succeeded.
    pub merged_output: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot open '{}': {detail}", path.display())]
    Open { path: PathBuf, detail: String },
    #[error("font resolution failed: {0}")]
    Font(#[from] FontError),
    #[error("no codec/container combination could be opened: {detail}")]
    Writer { detail: String },
    #[error("i/o failure during conversion: {0}")]
    Io(#[from] io::Error),
}

/// Caller-supplied rate wins when positive, then the source's native rate,
/// then the default.
pub fn resolve_fps(requested: f64, native: f64) -> f64 {
    if requested > 0.0 {
        requested
    } else if native > 0.0 {
        native
    } else {
        DEFAULT_FPS
    }
}

/// Run one conversion to completion, reporting progress and the outcome
/// over `events`. Blocking; callers start it on a dedicated thread.
pub fn run(request: RunRequest, cancel: CancelFlag, events: Sender<RunEvent>) {
    match convert(&request, &cancel, &events) {
        Ok(summary) => {
            let _ = events.send(RunEvent::Finished(summary));
        }
        Err(err) => {
            let _ = events.send(RunEvent::Failed(err));
        }
    }
}

fn convert(
    request: &RunRequest,
    cancel: &CancelFlag,
    events: &Sender<RunEvent>,
) -> Result<RunSummary, PipelineError> {
    let info = probe::probe(&request.input).map_err(|e| PipelineError::Open {
        path: request.input.clone(),
        detail: e.to_string(),
    })?;
    let fps = resolve_fps(request.render.fps, info.fps);

    let mut source =
        FrameSource::open(&request.input, info.width, info.height).map_err(|e| {
            PipelineError::Open {
                path: request.input.clone(),
                detail: e.to_string(),
            }
        })?;

    let _ = events.send(RunEvent::Started {
        width: info.width,
        height: info.height,
        fps,
    });

    let result = match &request.mode {
        OutputMode::Terminal => convert_terminal(request, &mut source, fps, cancel),
        OutputMode::Save {
            output,
            merge_audio,
        } => convert_save(request, output, *merge_audio, &mut source, fps, cancel, events),
    };

    // Input released before the outcome is reported, on every path
    source.close();
    result
}

fn convert_terminal(
    request: &RunRequest,
    source: &mut FrameSource,
    fps: f64,
    cancel: &CancelFlag,
) -> Result<RunSummary, PipelineError> {
    let cfg = &request.render;
    let stdout = io::stdout();
    let mut presenter = TerminalPresenter::new(stdout.lock());
    let mut pacer = FramePacer::new(fps);
    let mut frames = 0u64;
    let mut outcome = Outcome::Completed;

    loop {
        if cancel.is_cancelled() {
            outcome = Outcome::Cancelled;
            break;
        }
        let Some(frame) = source.next_frame()? else {
            break;
        };
        let grid = ascii::frame_to_grid(
            &frame.data,
            frame.width,
            frame.height,
            cfg.columns,
            cfg.scale,
            &cfg.ramp,
            cfg.invert,
        );
        presenter.present(&grid)?;
        frames += 1;
        pacer.pace();
    }

    Ok(RunSummary {
        outcome,
        frames,
        output: None,
        merged_output: None,
    })
}

fn convert_save(
    request: &RunRequest,
    output: &Path,
    merge_audio: bool,
    source: &mut FrameSource,
    fps: f64,
    cancel: &CancelFlag,
    events: &Sender<RunEvent>,
) -> Result<RunSummary, PipelineError> {
    let font = FontResolver::with_preferred(request.render.font_path.as_deref()).resolve()?;
    let style = FrameStyle::new(font, &request.render);
    let cfg = &request.render;

    let (sink, frames, outcome) = save_loop(
        || source.next_frame(),
        |frame| {
            let grid = ascii::frame_to_grid(
                &frame.data,
                frame.width,
                frame.height,
                cfg.columns,
                cfg.scale,
                &cfg.ramp,
                cfg.invert,
            );
            renderer::rasterize(&grid, &style)
        },
        |width, height| {
            let open =
                writer::open_with_fallback(output, |profile, path| {
                    VideoWriter::open(path, profile, width, height, fps)
                });
            match open {
                WriterOpen::Opened { writer, path } => {
                    if path.as_path() != output {
                        let _ = events.send(RunEvent::Warning(format!(
                            "primary encoder unavailable; writing {}",
                            path.display()
                        )));
                    }
                    Ok(writer)
                }
                WriterOpen::Failed { reason } => Err(PipelineError::Writer { detail: reason }),
            }
        },
        style.background(),
        cancel,
        |written| {
            let _ = events.send(RunEvent::Progress { frames: written });
        },
    )?;

    let written_path = match sink {
        Some(writer) => Some(writer.finish().map_err(|e| PipelineError::Writer {
            detail: e.to_string(),
        })?),
        None => {
            let _ = events.send(RunEvent::Warning(
                "input contained no decodable frames; no output written".to_string(),
            ));
            None
        }
    };

    let mut merged_output = None;
    if merge_audio && outcome == Outcome::Completed {
        if let Some(ref path) = written_path {
            match remux::merge_audio(path, &request.input) {
                Ok(merged) => merged_output = Some(merged),
                Err(err) => {
                    let _ = events.send(RunEvent::Warning(err.to_string()));
                }
            }
        }
    }

    Ok(RunSummary {
        outcome,
        frames,
        output: written_path,
        merged_output,
    })
}

/// Destination for rendered save-mode frames.
///
/// [`VideoWriter`] is the production sink; tests record write calls to
/// verify the canvas contract.
pub trait FrameSink {
    /// The canvas size established when the sink was opened.
    fn dimensions(&self) -> (u32, u32);
    fn write_frame(&mut self, frame: &RgbImage) -> io::Result<()>;
}

impl FrameSink for VideoWriter {
    fn dimensions(&self) -> (u32, u32) {
        VideoWriter::dimensions(self)
    }

    fn write_frame(&mut self, frame: &RgbImage) -> io::Result<()> {
        VideoWriter::write_frame(self, frame)
    }
}

/// Drive the save-mode frame loop.
///
/// The sink is opened lazily on the first rendered frame, fixing the canvas
/// size for the rest of the run. A frame whose rendered size disagrees with
/// the canvas (possible only with inconsistent inputs, since configuration
/// is constant) is letterboxed to fit, never stretched. A failed write
/// skips that frame and the run continues; a failed open aborts.
///
/// Generic over source, renderer and sink so the lifecycle rules are
/// testable without ffmpeg or a font on the machine.
pub fn save_loop<S, FN, FR, FO, FP>(
    mut next_frame: FN,
    mut render: FR,
    mut open_sink: FO,
    background: Rgb<u8>,
    cancel: &CancelFlag,
    mut on_frame: FP,
) -> Result<(Option<S>, u64, Outcome), PipelineError>
where
    S: FrameSink,
    FN: FnMut() -> io::Result<Option<GrayFrame>>,
    FR: FnMut(&GrayFrame) -> RgbImage,
    FO: FnMut(u32, u32) -> Result<S, PipelineError>,
    FP: FnMut(u64),
{
    let mut sink: Option<S> = None;
    let mut written = 0u64;
    let mut frame_index = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Ok((sink, written, Outcome::Cancelled));
        }
        let Some(frame) = next_frame()? else {
            break;
        };
        frame_index += 1;
        let image = render(&frame);

        if sink.is_none() {
            let (width, height) = image.dimensions();
            sink = Some(open_sink(width, height)?);
        }
        if let Some(active) = sink.as_mut() {
            let (canvas_w, canvas_h) = active.dimensions();
            let image = if image.dimensions() != (canvas_w, canvas_h) {
                log::warn!(
                    "frame {} rendered at {}x{}, canvas is {}x{}; letterboxing",
                    frame_index,
                    image.width(),
                    image.height(),
                    canvas_w,
                    canvas_h
                );
                renderer::fit_to_canvas(image, canvas_w, canvas_h, background)
            } else {
                image
            };
            match active.write_frame(&image) {
                Ok(()) => {
                    written += 1;
                    on_frame(written);
                }
                Err(err) => {
                    log::warn!("failed to write frame {}: {}; frame skipped", frame_index, err);
                }
            }
        }
    }

    Ok((sink, written, Outcome::Completed))
}
