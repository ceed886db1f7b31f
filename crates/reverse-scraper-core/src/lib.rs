//! Core functionality for finding larger copies of local images through a
//! reverse image search.
//!
//! This library provides the building blocks of a batch run:
//! - Input discovery and image measurement
//! - Search submission and candidate link extraction
//! - Candidate evaluation and placement of originals and matches
//! - Collision-safe file operations

// -- External Dependencies --
use log::info;
use std::ffi::OsString;

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::{clamp_link_count, Config, LinkBounds, LogLevel};
pub use error::{Error, Result};
pub use report::{ConsoleReporter, Event, LogReporter, Reporter};
pub use session::{MemorySession, SearchSession, WebSession};
pub use types::*;

// -- Public Modules --
pub mod batch;
pub mod config;
pub mod discovery;
pub mod evaluate;
pub mod extract;
pub mod fileops;
pub mod flatten;
pub mod logging;
pub mod pipeline;
pub mod placement;
pub mod probe;
pub mod progress;
pub mod report;
pub mod search;
pub mod selftest;
pub mod session;
pub mod types;

// -- Test Modules --
#[cfg(test)]
pub mod test_utils;

/// Main entry point for a search run
pub struct ReverseScraper {
    config: Config,
}

impl ReverseScraper {
    /// Create a new ReverseScraper after checking the configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Images waiting in the input folder. Fails with `EmptyInput` when there
    /// are none, so callers can stop before asking anything of the user.
    pub fn pending_images(&self) -> Result<Vec<OsString>> {
        let workspace = batch::prepare_workspace(&self.config)?;
        discovery::list_input_images(&workspace.input_dir)
    }

    /// Search every image in the input folder with live web sessions
    pub fn run(&self, mode: RunMode, links: usize) -> Result<BatchSummary> {
        let user_agent = self.config.user_agent.clone();
        batch::run_batch(&self.config, mode, links, || WebSession::new(&user_agent))
    }

    /// Fold single-file result folders back into the no-match folder
    pub fn extract(&self) -> Result<usize> {
        let output_dir = fileops::resolve_base(&self.config.output_dir)?;
        info!("Extracting single-file folders in {}", output_dir.display());
        flatten::extract_single_file_folders(&output_dir, &self.config.no_match_folder)
    }
}
