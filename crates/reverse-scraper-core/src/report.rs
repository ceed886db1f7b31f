//! Status reporting for the per-file pipeline.
//!
//! Every event goes to the log. In single-process mode events are also
//! printed as coloured status lines; in parallel mode the progress bar is
//! the only console output.

use console::style;
use log::{log, Level};
use std::path::PathBuf;

use crate::probe::Dimensions;

/// Something worth telling the user about while a file is processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A candidate link held no usable image
    InvalidLink { link: String, reason: String },
    /// A larger candidate could not be written
    SaveFailed { link: String, error: String },
    /// A larger candidate was written
    Saved { title: String, dimensions: Dimensions },
    /// A candidate was not larger than the source
    SkippedSmaller { link: String, dimensions: Dimensions },
    /// A note about a blocked candidate was left next to the matches
    ForbiddenNote { folder: PathBuf },
    /// The note about a blocked candidate could not be written
    NoteFailed { folder: PathBuf, error: String },
    /// The source image could not be measured
    SourceUnreadable { filename: String, reason: String },
    /// The source image left the input folder
    Moved { filename: String, destination: PathBuf },
}

impl Event {
    pub fn severity(&self) -> Level {
        match self {
            Event::InvalidLink { .. } => Level::Warn,
            Event::SaveFailed { .. } => Level::Error,
            Event::Saved { .. } => Level::Info,
            Event::SkippedSmaller { .. } => Level::Debug,
            Event::ForbiddenNote { .. } => Level::Warn,
            Event::NoteFailed { .. } => Level::Error,
            Event::SourceUnreadable { .. } => Level::Error,
            Event::Moved { .. } => Level::Info,
        }
    }

    /// Plain one-line description, used for the log
    pub fn message(&self) -> String {
        match self {
            Event::InvalidLink { link, reason } => format!("Invalid image link {} ({})", link, reason),
            Event::SaveFailed { link, error } => format!("Image failed to save {} ({})", link, error),
            Event::Saved { title, dimensions } => format!(
                "Saved image {}; width {} height {}",
                title, dimensions.width, dimensions.height
            ),
            Event::SkippedSmaller { link, dimensions } => {
                format!("Skipping smaller image {} ({})", link, dimensions)
            }
            Event::ForbiddenNote { folder } => {
                format!("Forbidden candidate noted in {}", folder.display())
            }
            Event::NoteFailed { folder, error } => {
                format!("Could not write forbidden note in {} ({})", folder.display(), error)
            }
            Event::SourceUnreadable { filename, reason } => {
                format!("Could not read {} ({})", filename, reason)
            }
            Event::Moved {
                filename,
                destination,
            } => format!("{} moved to {}", filename, destination.display()),
        }
    }

    /// Coloured status line for the console
    pub fn status_line(&self) -> String {
        match self {
            Event::InvalidLink { link, .. } => {
                style(format!("[+] Invalid image link!     {}", link)).red().to_string()
            }
            Event::SaveFailed { link, .. } => {
                style(format!("[+] Image failed to save:   {}", link)).red().to_string()
            }
            Event::Saved { title, dimensions } => format!(
                "{}{}{}{}{}{}",
                style("Saved image:").green().bright(),
                title,
                style("; width:").green().bright(),
                dimensions.width,
                style(" height:").green().bright(),
                dimensions.height
            ),
            Event::SkippedSmaller { link, .. } => {
                style(format!("[+] Skipping smaller image: {}", link)).red().to_string()
            }
            Event::ForbiddenNote { .. } => style("[+] Larger image may be blocked - note written")
                .yellow()
                .to_string(),
            Event::NoteFailed { .. } => {
                style("[+] Forbidden note failed to save").red().to_string()
            }
            Event::SourceUnreadable { filename, .. } => {
                style(format!("[+] Could not read image:   {}", filename)).red().to_string()
            }
            Event::Moved { filename, .. } => format!(
                "{}\n",
                style(format!("{} moved to output.", filename)).green().bright()
            ),
        }
    }
}

/// Receives pipeline events. Shared by every worker.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &Event);
}

/// Logs events only
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: &Event) {
        log!(event.severity(), "{}", event.message());
    }
}

/// Logs events and prints a status line for each
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, event: &Event) {
        LogReporter.report(event);
        println!("{}", event.status_line());
    }
}
