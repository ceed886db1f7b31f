//! Per-file pipeline: measure, upload, extract, evaluate, place.

use log::{debug, info};
use std::ffi::OsStr;
use std::time::Instant;

use crate::config::Config;
use crate::error::Result;
use crate::evaluate::{evaluate_candidates, Verdict};
use crate::extract::{extract_candidates, SearchSite};
use crate::fileops::{self, SavePolicy};
use crate::placement::{place, Placement, PlacementOutcome, PlacementTargets};
use crate::probe::measure_file;
use crate::report::{Event, Reporter};
use crate::search::submit;
use crate::session::SearchSession;
use crate::types::{FileReport, Workspace};

/// Read-only settings shared by every file of a run
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub targets: PlacementTargets,
    pub site: SearchSite,
    /// Maximum number of candidate links tried per file
    pub links: usize,
    pub max_pixels: u64,
}

impl PipelineContext {
    pub fn new(config: &Config, workspace: &Workspace, links: usize) -> Self {
        Self {
            targets: PlacementTargets {
                input_dir: workspace.input_dir.clone(),
                output_dir: workspace.output_dir.clone(),
                no_match_dir: workspace.no_match_dir.clone(),
                forbidden_note: config.forbidden_note.clone(),
                save: SavePolicy {
                    attempts: config.save_attempts,
                    delay: config.save_retry_delay(),
                },
            },
            site: SearchSite {
                upload_endpoint: config.upload_endpoint.clone(),
                site_base: config.site_base.clone(),
                anchor_label: config.anchor_label.clone(),
            },
            links,
            max_pixels: config.max_pixels,
        }
    }
}

/// Process one file from the input folder.
///
/// Returns an error only for failures that must end the whole run; everything
/// else is folded into the report.
pub fn process_file<S, N>(
    session: &S,
    ctx: &PipelineContext,
    reporter: &dyn Reporter,
    file_name: &N,
) -> Result<FileReport>
where
    S: SearchSession + ?Sized,
    N: AsRef<OsStr> + ?Sized,
{
    let start = Instant::now();
    let file_name = file_name.as_ref();
    let path = ctx.targets.input_dir.join(file_name);
    info!("Processing {}", path.display());

    let source = match measure_file(&path, ctx.max_pixels) {
        Ok(dimensions) => dimensions,
        Err(e) => {
            reporter.report(&Event::SourceUnreadable {
                filename: file_name.to_string_lossy().into_owned(),
                reason: e.to_string(),
            });
            let outcome = move_unmatched(file_name, ctx, reporter)?;
            return Ok(report(file_name, outcome, 0, 0, start));
        }
    };
    debug!("{} measures {}", path.display(), source);

    let Some(results_url) = submit(session, &ctx.site.upload_endpoint, &path)? else {
        let outcome = move_unmatched(file_name, ctx, reporter)?;
        return Ok(report(file_name, outcome, 0, 0, start));
    };

    let links = extract_candidates(session, &results_url, &ctx.site, ctx.links);
    let evaluations = evaluate_candidates(session, &links, &source, ctx.max_pixels);

    let invalid = evaluations
        .iter()
        .filter(|e| matches!(e.verdict, Verdict::Invalid { .. }))
        .count();
    let too_small = evaluations
        .iter()
        .filter(|e| matches!(e.verdict, Verdict::TooSmall { .. }))
        .count();

    let outcome = place(file_name, evaluations, &ctx.targets, reporter)?;
    Ok(report(file_name, outcome, invalid, too_small, start))
}

fn move_unmatched(
    file_name: &OsStr,
    ctx: &PipelineContext,
    reporter: &dyn Reporter,
) -> Result<PlacementOutcome> {
    let destination = ctx.targets.no_match_dir.clone();
    let original = fileops::move_file(file_name, &ctx.targets.input_dir, &destination)?;
    reporter.report(&Event::Moved {
        filename: file_name.to_string_lossy().into_owned(),
        destination: destination.clone(),
    });

    Ok(PlacementOutcome {
        placement: Placement::NoMatch(destination),
        original,
        saved: 0,
        save_failures: 0,
        forbidden_notes: 0,
    })
}

fn report(
    file_name: &OsStr,
    outcome: PlacementOutcome,
    invalid: usize,
    too_small: usize,
    start: Instant,
) -> FileReport {
    FileReport {
        file: file_name.to_string_lossy().into_owned(),
        outcome,
        invalid,
        too_small,
        elapsed: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::report::LogReporter;
    use crate::session::{MemorySession, UploadReply, UploadScript};
    use crate::test_utils::png_bytes;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    const RESULTS: &str = "https://search.test/results";
    const ALL_SIZES: &str = "https://www.google.com/sizes?q=cat";

    fn context(root: &Path) -> PipelineContext {
        let workspace = Workspace {
            input_dir: root.join("input"),
            output_dir: root.join("output"),
            no_match_dir: root.join("output").join("(-) Default Results"),
        };
        fs::create_dir_all(&workspace.input_dir).unwrap();
        fs::create_dir_all(&workspace.no_match_dir).unwrap();
        PipelineContext::new(&Config::default(), &workspace, 6)
    }

    fn results_page() -> String {
        "<html><body><a href=\"/sizes?q=cat\"><span>All sizes</span></a></body></html>".to_string()
    }

    fn sizes_page(links: &[&str]) -> String {
        let quoted: Vec<String> = links.iter().map(|l| format!("\"{}\"", l)).collect();
        format!("<html><script>var data = [{}];</script></html>", quoted.join(","))
    }

    #[test]
    fn test_larger_candidate_is_kept() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        fs::write(ctx.targets.input_dir.join("cat.jpg"), png_bytes(100, 100)).unwrap();

        let session = MemorySession::redirecting_to(RESULTS)
            .page(RESULTS, &results_page())
            .page(
                ALL_SIZES,
                &sizes_page(&["https://a.com/big.jpg", "https://b.com/broken.jpg"]),
            )
            .resource("https://a.com/big.jpg", 200, png_bytes(300, 200))
            .resource("https://b.com/broken.jpg", 200, b"not an image".to_vec());

        let report = process_file(&session, &ctx, &LogReporter, "cat.jpg").unwrap();
        let folder = ctx.targets.output_dir.join("cat(jpg)");

        assert!(report.outcome.matched());
        assert_eq!(report.outcome.saved, 1);
        assert_eq!(report.invalid, 1);
        assert!(folder.join("big.jpg").exists());
        assert!(folder.join("cat.jpg").exists());
        assert!(!ctx.targets.input_dir.join("cat.jpg").exists());
    }

    #[test]
    fn test_payload_too_large_goes_to_no_match() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        fs::write(ctx.targets.input_dir.join("huge.png"), png_bytes(40, 40)).unwrap();

        let session = MemorySession::with_upload(UploadScript::Reply(UploadReply {
            status: 413,
            location: None,
        }));

        let report = process_file(&session, &ctx, &LogReporter, "huge.png").unwrap();

        assert!(!report.outcome.matched());
        assert!(ctx.targets.no_match_dir.join("huge.png").exists());
        assert_eq!(session.calls().len(), 1);
    }

    #[test]
    fn test_unreadable_source_goes_to_no_match() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        fs::write(ctx.targets.input_dir.join("fake.jpg"), b"plain text").unwrap();

        let session = MemorySession::redirecting_to(RESULTS);
        let report = process_file(&session, &ctx, &LogReporter, "fake.jpg").unwrap();

        assert!(!report.outcome.matched());
        assert!(session.calls().is_empty());
        assert!(ctx.targets.no_match_dir.join("fake.jpg").exists());
    }

    #[test]
    fn test_disconnected_upload_is_fatal() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        fs::write(ctx.targets.input_dir.join("cat.jpg"), png_bytes(10, 10)).unwrap();

        let session = MemorySession::with_upload(UploadScript::Disconnected);
        let result = process_file(&session, &ctx, &LogReporter, "cat.jpg");

        assert!(matches!(result, Err(Error::Connection(_))));
        assert!(ctx.targets.input_dir.join("cat.jpg").exists());
    }
}
