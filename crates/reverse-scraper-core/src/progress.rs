use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::time::Instant;

use crate::types::{format_elapsed, FileReport};

/// Progress tracker for a parallel batch
pub struct ProgressTracker {
    /// Total number of files in the batch
    total: usize,
    bar: ProgressBar,
    start_time: Instant,
    matched: usize,
    unmatched: usize,
}

impl ProgressTracker {
    /// Create a tracker drawing to stderr
    pub fn new(total_files: usize) -> Self {
        let bar = ProgressBar::new(total_files as u64);
        let style = ProgressStyle::default_bar()
            .template("{wide_bar} {pos}/{len} ({percent}%) | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ ");
        bar.set_style(style);
        bar.set_message("Searching...");

        Self {
            total: total_files,
            bar,
            start_time: Instant::now(),
            matched: 0,
            unmatched: 0,
        }
    }

    /// Record one finished file
    pub fn increment(&mut self, report: &FileReport) {
        if report.outcome.matched() {
            self.matched += 1;
        } else {
            self.unmatched += 1;
        }
        self.bar.inc(1);

        let done = self.matched + self.unmatched;
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { done as f64 / elapsed } else { 0.0 };

        // Remaining files for ETA
        let remaining = self.total.saturating_sub(done);
        let eta = if rate > 0.0 {
            format!("{}s", (remaining as f64 / rate) as u64)
        } else {
            "-".to_string()
        };

        self.bar.set_message(format!(
            "{:.2} img/s | {} matched | {} unmatched | ETA: {}",
            rate, self.matched, self.unmatched, eta
        ));
    }

    /// Stop drawing and leave the final state on screen
    pub fn finish(&self) {
        let elapsed = self.start_time.elapsed();
        info!(
            "Batch finished: {} matched, {} unmatched in {}",
            self.matched,
            self.unmatched,
            format_elapsed(elapsed)
        );
        self.bar.finish_with_message(format!(
            "Completed {} files | {} matched | {} unmatched",
            self.matched + self.unmatched,
            self.matched,
            self.unmatched
        ));
    }

    /// Stop drawing after a fatal error
    pub fn abandon(&self, reason: &str) {
        self.bar.abandon_with_message(format!("Stopped: {}", reason));
    }
}
