use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::placement::PlacementOutcome;

/// How a batch is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunMode {
    /// One worker per physical core, progress bar only
    Parallel,
    /// One file at a time with a status line per event
    Single,
}

/// What happened to one source file
#[derive(Debug, Clone)]
pub struct FileReport {
    /// File name as found in the input folder, lossily decoded for display
    pub file: String,
    pub outcome: PlacementOutcome,
    /// Candidate links that held no usable image
    pub invalid: usize,
    /// Candidate links that were not larger than the source
    pub too_small: usize,
    pub elapsed: Duration,
}

/// Totals for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub files: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub images_saved: usize,
    pub save_failures: usize,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn record(&mut self, report: &FileReport) {
        self.files += 1;
        if report.outcome.matched() {
            self.matched += 1;
        } else {
            self.unmatched += 1;
        }
        self.images_saved += report.outcome.saved;
        self.save_failures += report.outcome.save_failures;
    }

    /// Elapsed time as "Xm, Ysec"
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed)
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files processed ({} matched, {} without matches), {} images saved in {}",
            self.files,
            self.matched,
            self.unmatched,
            self.images_saved,
            self.elapsed_display()
        )
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}m, {}sec", secs / 60, secs % 60)
}

/// Resolved folders for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub no_match_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0m, 0sec");
        assert_eq!(format_elapsed(Duration::from_millis(59_900)), "0m, 59sec");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m, 5sec");
    }
}
