use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for playback and detection runs.
///
/// Use cases report frame progress, readiness stalls and stage timings
/// through this trait instead of logging directly.
pub trait PipelineLogger: Send {
    /// A frame was handled; `current` is its 1-based position and `total`
    /// the known frame count (0 if unknown).
    fn progress(&mut self, current: usize, total: usize);

    /// The frame at `position` was not ready for the `streak`-th time in a row.
    fn not_ready(&mut self, position: usize, streak: u32);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger for tests and embedding callers.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn not_ready(&mut self, _position: usize, _streak: u32) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// `log`-backed logger with throttled progress and a summary report.
///
/// Progress is emitted every `throttle_frames` frames. Stalls are logged at
/// warn level on the first miss of a frame and at debug level afterwards.
/// `run` names the run in the summary header, e.g. "Playback".
pub struct LogPipelineLogger {
    run: String,
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames: usize,
    not_ready: usize,
    last_position: usize,
}

impl LogPipelineLogger {
    pub fn new(run: impl Into<String>, throttle_frames: usize) -> Self {
        Self {
            run: run.into(),
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
            not_ready: 0,
            last_position: 0,
        }
    }

    pub fn playback() -> Self {
        Self::new("Playback", 30)
    }

    pub fn detection() -> Self {
        Self::new("Detection", 30)
    }

    /// Returns the formatted summary string, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 && self.not_ready == 0 && self.timings.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "{} summary ({} frames, {} not ready, last position {}, {:.1}s total):",
            self.run,
            self.frames,
            self.not_ready,
            self.last_position,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len().max(1) as f64;
            lines.push(format!("  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms"));
        }

        if self.frames > 0 && elapsed_ms > 0.0 {
            let fps = self.frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn not_ready_count(&self) -> usize {
        self.not_ready
    }
}

impl PipelineLogger for LogPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames += 1;
        self.last_position = current;
        if current % self.throttle_frames == 0 || current == total {
            if total > 0 {
                let pct = current as f64 / total as f64 * 100.0;
                log::info!("Frame {current}/{total} ({pct:.1}%)");
            } else {
                log::info!("Frame {current}");
            }
        }
    }

    fn not_ready(&mut self, position: usize, streak: u32) {
        self.not_ready += 1;
        self.last_position = position;
        if streak == 1 {
            log::warn!("Frame at position {position} not ready, waiting");
        } else {
            log::debug!("Frame at position {position} still not ready ({streak} attempts)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
