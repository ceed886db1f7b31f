use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::{Fetched, SearchSession, UploadReply};
use crate::error::{Error, Result};

/// How a [`MemorySession`] answers uploads
#[derive(Debug, Clone)]
pub enum UploadScript {
    /// Answer every upload with this reply
    Reply(UploadReply),
    /// Behave as if the network were down
    Disconnected,
}

/// Scripted in-memory session. Serves canned pages and resources and keeps
/// a log of every call made through it, in order.
///
/// Unknown pages fail to render; unknown resources fail to fetch.
#[derive(Debug)]
pub struct MemorySession {
    upload: UploadScript,
    pages: HashMap<String, String>,
    resources: HashMap<String, Fetched>,
    calls: Mutex<Vec<String>>,
}

impl MemorySession {
    /// A session whose uploads redirect to `results_url`
    pub fn redirecting_to(results_url: &str) -> Self {
        Self::with_upload(UploadScript::Reply(UploadReply {
            status: 302,
            location: Some(results_url.to_string()),
        }))
    }

    pub fn with_upload(upload: UploadScript) -> Self {
        Self {
            upload,
            pages: HashMap::new(),
            resources: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Serve `html` as the rendered form of `url`
    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Serve `body` with `status` when `url` is fetched
    pub fn resource(mut self, url: &str, status: u16, body: Vec<u8>) -> Self {
        self.resources
            .insert(url.to_string(), Fetched { status, body });
        self
    }

    /// Every call so far, formatted as `METHOD target`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl SearchSession for MemorySession {
    fn upload(&self, endpoint: &str, image: &Path) -> Result<UploadReply> {
        self.record(format!("UPLOAD {} {}", endpoint, image.display()));
        if !image.exists() {
            return Err(Error::FileNotFound(image.to_path_buf()));
        }

        match &self.upload {
            UploadScript::Reply(reply) => Ok(reply.clone()),
            UploadScript::Disconnected => {
                Err(Error::Connection(format!("{} is unreachable", endpoint)))
            }
        }
    }

    fn render(&self, url: &str) -> Result<String> {
        self.record(format!("RENDER {}", url));
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Render(format!("no page at {}", url)))
    }

    fn fetch(&self, url: &str) -> Result<Fetched> {
        self.record(format!("FETCH {}", url));
        self.resources
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Connection(format!("no resource at {}", url)))
    }
}
