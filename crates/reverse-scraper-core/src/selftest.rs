//! Offline self-test: drives the per-file pipeline against scripted search
//! responses in a scratch workspace.

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use log::info;
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::pipeline::{process_file, PipelineContext};
use crate::report::LogReporter;
use crate::session::{MemorySession, UploadReply, UploadScript};
use crate::types::Workspace;

const RESULTS: &str = "https://selftest.invalid/results";
const ALL_SIZES: &str = "https://www.google.com/selftest-sizes";

/// Encode a black PNG of the given size
pub fn sample_png(width: u32, height: u32) -> Result<Vec<u8>> {
    let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageOutputFormat::Png)
        .map_err(|e| Error::Unknown(format!("Failed to encode sample image: {}", e)))?;
    Ok(bytes.into_inner())
}

/// Result of one self-test scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Default)]
pub struct SelfTestReport {
    pub checks: Vec<Check>,
}

impl SelfTestReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    fn push(&mut self, name: &'static str, outcome: Result<String>) {
        let check = match outcome {
            Ok(detail) => Check {
                name,
                passed: true,
                detail,
            },
            Err(e) => Check {
                name,
                passed: false,
                detail: e.to_string(),
            },
        };
        info!("Self-test {}: {} ({})", name, check.passed, check.detail);
        self.checks.push(check);
    }
}

impl fmt::Display for SelfTestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            let mark = if check.passed { "ok" } else { "FAILED" };
            writeln!(f, "{:<28} {:<6} {}", check.name, mark, check.detail)?;
        }
        Ok(())
    }
}

/// Run every scenario in its own scratch workspace
pub fn run() -> Result<SelfTestReport> {
    let mut report = SelfTestReport::default();
    report.push("larger match", scenario(larger_match));
    report.push("invalid link", scenario(invalid_link));
    report.push("forbidden larger candidate", scenario(forbidden_candidate));
    report.push("upload too large", scenario(upload_too_large));
    Ok(report)
}

fn scenario(body: fn(&Path) -> Result<String>) -> Result<String> {
    let scratch = tempfile::tempdir()?;
    body(scratch.path())
}

fn context(root: &Path, source: &str, width: u32, height: u32) -> Result<PipelineContext> {
    let workspace = Workspace {
        input_dir: root.join("input"),
        output_dir: root.join("output"),
        no_match_dir: root.join("output").join(Config::default().no_match_folder),
    };
    fs::create_dir_all(&workspace.input_dir)?;
    fs::create_dir_all(&workspace.no_match_dir)?;
    fs::write(workspace.input_dir.join(source), sample_png(width, height)?)?;
    Ok(PipelineContext::new(&Config::default(), &workspace, 6))
}

fn scripted(links: &[&str]) -> MemorySession {
    let results = "<html><body><div><a href=\"/selftest-sizes\">All sizes</a></div></body></html>";
    let script: Vec<String> = links.iter().map(|link| format!("'{}'", link)).collect();
    let sizes = format!(
        "<html><head><script>AF_initDataCallback([{}]);</script></head></html>",
        script.join(",")
    );
    MemorySession::redirecting_to(RESULTS)
        .page(RESULTS, results)
        .page(ALL_SIZES, &sizes)
}

fn ensure(condition: bool, what: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::Unknown(what.to_string()))
    }
}

fn larger_match(root: &Path) -> Result<String> {
    let ctx = context(root, "cat.jpg", 100, 100)?;
    let session = scripted(&["https://a.selftest/big.jpg"]).resource(
        "https://a.selftest/big.jpg",
        200,
        sample_png(300, 200)?,
    );

    let report = process_file(&session, &ctx, &LogReporter, "cat.jpg")?;
    let folder = ctx.targets.output_dir.join("cat(jpg)");
    ensure(report.outcome.matched(), "source was not matched")?;
    ensure(folder.join("big.jpg").is_file(), "larger copy was not saved")?;
    ensure(folder.join("cat.jpg").is_file(), "source was not moved")?;
    Ok(format!("{} saved", report.outcome.saved))
}

fn invalid_link(root: &Path) -> Result<String> {
    let ctx = context(root, "cat.jpg", 100, 100)?;
    let session = scripted(&["https://a.selftest/broken.png"]).resource(
        "https://a.selftest/broken.png",
        200,
        b"<html>not an image</html>".to_vec(),
    );

    let report = process_file(&session, &ctx, &LogReporter, "cat.jpg")?;
    ensure(report.invalid == 1, "broken link was not flagged")?;
    ensure(!report.outcome.matched(), "broken link produced a match")?;
    ensure(
        ctx.targets.no_match_dir.join("cat.jpg").is_file(),
        "source was not moved to the no-match folder",
    )?;
    Ok("flagged and skipped".to_string())
}

fn forbidden_candidate(root: &Path) -> Result<String> {
    let ctx = context(root, "dog.png", 50, 50)?;
    let session = scripted(&["https://a.selftest/blocked.png"]).resource(
        "https://a.selftest/blocked.png",
        403,
        sample_png(80, 80)?,
    );

    let report = process_file(&session, &ctx, &LogReporter, "dog.png")?;
    let folder = ctx.targets.output_dir.join("dog(png)");
    ensure(report.outcome.forbidden_notes == 1, "no forbidden note")?;
    ensure(
        folder.join(&ctx.targets.forbidden_note).is_file(),
        "forbidden note missing on disk",
    )?;
    Ok("saved with note".to_string())
}

fn upload_too_large(root: &Path) -> Result<String> {
    let ctx = context(root, "huge.png", 10, 10)?;
    let session = MemorySession::with_upload(UploadScript::Reply(UploadReply {
        status: 413,
        location: None,
    }));

    let report = process_file(&session, &ctx, &LogReporter, "huge.png")?;
    ensure(!report.outcome.matched(), "oversized upload produced a match")?;
    ensure(session.calls().len() == 1, "search continued after a 413")?;
    Ok("routed to no-match".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_png_measures() {
        let bytes = sample_png(7, 3).unwrap();
        let dims = crate::probe::measure_bytes(&bytes, crate::probe::DEFAULT_MAX_PIXELS).unwrap();
        assert_eq!((dims.width, dims.height), (7, 3));
    }

    #[test]
    fn test_self_test_passes() {
        let report = run().unwrap();
        assert_eq!(report.checks.len(), 4);
        assert!(report.passed(), "{}", report);
    }
}
