//! Network sessions used by the per-file pipeline.
//!
//! A session is owned by exactly one worker and performs every HTTP
//! interaction for the files that worker processes.

mod memory;
mod web;

pub use memory::{MemorySession, UploadScript};
pub use web::WebSession;

use std::path::Path;

use crate::error::Result;

/// HTTP status the search endpoint uses for an oversized upload
pub const PAYLOAD_TOO_LARGE: u16 = 413;

/// HTTP status that marks a candidate as possibly blocked
pub const FORBIDDEN: u16 = 403;

/// What the search endpoint answered to an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReply {
    pub status: u16,
    /// Redirect target, read without following it
    pub location: Option<String>,
}

/// A fetched resource: its status and whatever body came with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub status: u16,
    pub body: Vec<u8>,
}

/// All network interactions of one pipeline
pub trait SearchSession {
    /// Upload an image as multipart form data without following redirects.
    ///
    /// Fails with [`crate::Error::Connection`] when the endpoint cannot be
    /// reached.
    fn upload(&self, endpoint: &str, image: &Path) -> Result<UploadReply>;

    /// Load a page, run its scripts, and return the resulting markup
    fn render(&self, url: &str) -> Result<String>;

    /// Fetch a resource body together with its status
    fn fetch(&self, url: &str) -> Result<Fetched>;
}
