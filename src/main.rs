use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use clap::{Parser, Subcommand};

use glyphcast::config::{FileConfig, RenderConfig};
use glyphcast::pipeline::{self, CancelFlag, Outcome, OutputMode, RunEvent, RunRequest};

/// Parse and validate a column count (>= 1)
fn parse_columns(s: &str) -> Result<u32, String> {
    let columns: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid column count", s))?;
    if columns == 0 {
        return Err("column count must be at least 1".to_string());
    }
    Ok(columns)
}

/// Parse and validate a frame rate (>= 0, 0 = use the source's rate)
fn parse_fps(s: &str) -> Result<f64, String> {
    let fps: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid frame rate", s))?;
    if !fps.is_finite() || fps < 0.0 {
        return Err(format!("frame rate must be >= 0, got {}", fps));
    }
    Ok(fps)
}

/// glyphcast: play or render videos as ASCII art
#[derive(Parser)]
#[command(name = "glyphcast")]
#[command(version, about = "Play or render videos as ASCII art")]
#[command(after_help = "EXAMPLES:
    # Play a clip in the terminal at its native frame rate
    glyphcast play clip.mp4

    # Narrower output for a small terminal, inverted for a light theme
    glyphcast play clip.mp4 --columns 80 --invert

    # Render to a new video, keeping the original audio
    glyphcast save clip.mp4 -o ascii.mp4 --merge-audio

    # Bigger glyphs, custom font
    glyphcast save clip.mp4 --font-size 16 --font /path/to/Mono.ttf")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the video as ASCII art in the terminal
    Play {
        /// Input video path
        input: PathBuf,

        /// ASCII output width in characters
        #[arg(long, value_parser = parse_columns)]
        columns: Option<u32>,

        /// Playback frame rate (0 = use the source's rate)
        #[arg(long, value_parser = parse_fps)]
        fps: Option<f64>,

        /// Invert brightness (for light terminal themes)
        #[arg(long)]
        invert: bool,

        /// Custom config file path (default: ~/.config/glyphcast/config.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },

    /// Render the video into a new ASCII-art video file
    Save {
        /// Input video path
        input: PathBuf,

        /// Output video path
        #[arg(long, short = 'o', default_value = "ascii_out.mp4")]
        output: PathBuf,

        /// ASCII output width in characters
        #[arg(long, value_parser = parse_columns)]
        columns: Option<u32>,

        /// Output frame rate (0 = use the source's rate)
        #[arg(long, value_parser = parse_fps)]
        fps: Option<f64>,

        /// Font size in pixels for the rendered frames
        #[arg(long)]
        font_size: Option<f32>,

        /// Font file to render with (tried before the platform defaults)
        #[arg(long)]
        font: Option<PathBuf>,

        /// Merge the original audio into the rendered video
        #[arg(long)]
        merge_audio: bool,

        /// Custom config file path (default: ~/.config/glyphcast/config.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let request = match build_request(cli.command) {
        Ok(request) => request,
        Err(message) => {
            eprintln!("error: {}", message);
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancelFlag::new();
    if let Err(err) = pipeline::setup_ctrlc_handler(cancel.clone()) {
        eprintln!("warning: could not install Ctrl+C handler: {}", err);
    }

    let (events_tx, events_rx) = mpsc::channel();
    let worker = thread::spawn({
        let cancel = cancel.clone();
        move || pipeline::run(request, cancel, events_tx)
    });

    let mut code = ExitCode::SUCCESS;
    for event in events_rx {
        match event {
            RunEvent::Started { width, height, fps } => {
                eprintln!("converting {}x{} input at {:.2} fps", width, height, fps);
            }
            RunEvent::Progress { frames } => {
                if frames % 24 == 0 {
                    eprint!("\r{} frames written", frames);
                }
            }
            RunEvent::Warning(message) => {
                eprintln!("\nwarning: {}", message);
            }
            RunEvent::Finished(summary) => {
                match summary.outcome {
                    Outcome::Completed => eprintln!("\ndone: {} frames", summary.frames),
                    Outcome::Cancelled => {
                        eprintln!("\ncancelled after {} frames", summary.frames)
                    }
                }
                if let Some(path) = summary.output {
                    eprintln!("ASCII video saved to {}", path.display());
                }
                if let Some(path) = summary.merged_output {
                    eprintln!("audio merged into {}", path.display());
                }
            }
            RunEvent::Failed(err) => {
                eprintln!("\nerror: {}", err);
                code = ExitCode::FAILURE;
            }
        }
    }

    let _ = worker.join();
    code
}

fn build_request(command: Commands) -> Result<RunRequest, String> {
    match command {
        Commands::Play {
            input,
            columns,
            fps,
            invert,
            config,
        } => {
            let mut render = base_config(config.as_deref())?;
            apply_overrides(&mut render, columns, fps, None, None, invert);
            Ok(RunRequest {
                input,
                mode: OutputMode::Terminal,
                render,
            })
        }
        Commands::Save {
            input,
            output,
            columns,
            fps,
            font_size,
            font,
            merge_audio,
            config,
        } => {
            let mut render = base_config(config.as_deref())?;
            apply_overrides(&mut render, columns, fps, font_size, font, false);
            Ok(RunRequest {
                input,
                mode: OutputMode::Save {
                    output,
                    merge_audio,
                },
                render,
            })
        }
    }
}

/// Defaults, then the config file on top.
fn base_config(config_path: Option<&std::path::Path>) -> Result<RenderConfig, String> {
    let file = FileConfig::load(config_path).map_err(|e| e.to_string())?;
    file.apply(RenderConfig::default()).map_err(|e| e.to_string())
}

/// CLI flags override whatever the file provided.
fn apply_overrides(
    render: &mut RenderConfig,
    columns: Option<u32>,
    fps: Option<f64>,
    font_size: Option<f32>,
    font: Option<PathBuf>,
    invert: bool,
) {
    if let Some(columns) = columns {
        render.columns = columns;
    }
    if let Some(fps) = fps {
        render.fps = fps;
    }
    if let Some(px) = font_size {
        render.font_px = px;
    }
    if let Some(font) = font {
        render.font_path = Some(font);
    }
    if invert {
        render.invert = true;
    }
}
