use std::path::PathBuf;
use thiserror::Error;

use crate::probe::ProbeError;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the reverse-scraper library
///
/// Anything that escapes a per-file pipeline as an `Error` ends the whole
/// run. Per-candidate failures are verdicts, not errors.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A local image could not be measured
    #[error("Image probe error: {0}")]
    Probe(#[from] ProbeError),

    /// The search endpoint could not be reached at all
    #[error("No connection: {0}")]
    Connection(String),

    /// Any other HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The search endpoint answered without the redirect we rely on
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// The headless browser failed to render a page
    #[error("Render error: {0}")]
    Render(String),

    /// A required output folder could not be created
    #[error("Creation of the directory {path} failed: {source}")]
    FolderCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Misconfigured bounds for the candidate cap
    #[error("Invalid link bounds: lower {lower}, upper {upper}")]
    InvalidBounds { lower: i64, upper: i64 },

    /// The input folder holds no searchable images
    #[error("Folder '{0}' is empty!")]
    EmptyInput(PathBuf),

    /// File not found error
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Unknown error
    #[error("Unknown error: {0}")]
    Unknown(String),
}
