// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Single-line console progress bar for frame loops.

use std::io::Write;
use std::time::Instant;

/// Bar width in characters.
const BAR_WIDTH: usize = 12;

/// Minimum seconds between redraws.
const MIN_UPDATE_INTERVAL: f64 = 0.1;

/// Format time duration.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn format_time(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{seconds:.1}s")
    } else if seconds < 3600.0 {
        let mins = (seconds / 60.0) as u32;
        let secs = seconds % 60.0;
        format!("{mins}:{secs:04.1}")
    } else {
        let hours = (seconds / 3600.0) as u32;
        let mins = ((seconds % 3600.0) / 60.0) as u32;
        let secs = seconds % 60.0;
        format!("{hours}:{mins:02}:{secs:04.1}")
    }
}

/// Generate progress bar string.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn generate_bar(progress: f64, width: usize) -> String {
    let progress = progress.clamp(0.0, 1.0);
    let filled = (progress * width as f64) as usize;
    let partial = progress * width as f64 - filled as f64;

    let mut bar = "━".repeat(filled);
    if filled < width {
        if partial > 0.5 {
            bar.push('╸');
            bar.push_str(&"─".repeat(width - filled - 1));
        } else {
            bar.push_str(&"─".repeat(width - filled));
        }
    }
    bar
}

/// Progress over a known number of frames, drawn on stderr.
pub struct FrameProgress {
    desc: String,
    total: usize,
    done: usize,
    start: Instant,
    last_draw: Option<Instant>,
    #[cfg_attr(not(test), allow(dead_code))]
    redraws: usize,
    enabled: bool,
}

impl FrameProgress {
    /// Start tracking `total` frames under the label `desc`.
    #[must_use]
    pub fn new(desc: impl Into<String>, total: usize) -> Self {
        Self {
            desc: desc.into(),
            total,
            done: 0,
            start: Instant::now(),
            last_draw: None,
            redraws: 0,
            enabled: crate::cli::logging::is_verbose(),
        }
    }

    /// Frames counted so far.
    #[must_use]
    pub const fn done(&self) -> usize {
        self.done
    }

    /// Count one more frame.
    ///
    /// The last frame is left to [`finish`](Self::finish) to draw.
    pub fn inc(&mut self) {
        self.done += 1;
        if self.done >= self.total {
            return;
        }
        let now = Instant::now();
        let due = self
            .last_draw
            .is_none_or(|t| now.duration_since(t).as_secs_f64() >= MIN_UPDATE_INTERVAL);
        if due {
            self.last_draw = Some(now);
            self.draw(false);
        }
    }

    /// Draw the final state and end the line.
    pub fn finish(&mut self) {
        self.draw(true);
    }

    #[allow(clippy::cast_precision_loss)]
    fn line(&self) -> String {
        let progress = if self.total == 0 {
            1.0
        } else {
            self.done as f64 / self.total as f64
        };
        format!(
            "{}: {:>3.0}% {} {}/{} {}",
            self.desc,
            progress * 100.0,
            generate_bar(progress, BAR_WIDTH),
            self.done,
            self.total,
            format_time(self.start.elapsed().as_secs_f64())
        )
    }

    fn draw(&mut self, newline: bool) {
        self.redraws += 1;
        if !self.enabled {
            return;
        }
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\r{}", self.line());
        if newline {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}
