//! Frame pacing for terminal playback.

use std::time::{Duration, Instant};

/// Paces frame emission to a target rate.
///
/// If rendering ran long, the next frame is emitted immediately; frames
/// are never dropped to catch up, they simply emit late.
pub struct FramePacer {
    period: Duration,
    last_emit: Option<Instant>,
}

impl FramePacer {
    /// A pacer for `fps` frames per second (non-positive falls back to 24).
    pub fn new(fps: f64) -> Self {
        let fps = if fps > 0.0 { fps } else { 24.0 };
        Self {
            period: Duration::from_secs_f64(1.0 / fps),
            last_emit: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Block until the next frame may be emitted, then record the emission
    /// instant. The first call never blocks.
    pub fn pace(&mut self) {
        if let Some(last) = self.last_emit {
            let elapsed = last.elapsed();
            if elapsed < self.period {
                std::thread::sleep(self.period - elapsed);
            }
        }
        self.last_emit = Some(Instant::now());
    }
}
