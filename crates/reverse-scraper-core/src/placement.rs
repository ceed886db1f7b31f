//! Placement decision: where the source file and its larger matches end up.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::evaluate::{Evaluation, Verdict};
use crate::fileops::{self, SavePolicy};
use crate::report::{Event, Reporter};

/// Output folders and write settings shared by every file of a run
#[derive(Debug, Clone)]
pub struct PlacementTargets {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub no_match_dir: PathBuf,
    pub forbidden_note: String,
    pub save: SavePolicy,
}

/// Final destination of a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Moved into its own folder next to the larger copies
    MatchFolder(PathBuf),
    /// Moved into the shared no-match folder
    NoMatch(PathBuf),
}

/// Everything placing one file did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementOutcome {
    pub placement: Placement,
    /// Where the source file now lives
    pub original: PathBuf,
    pub saved: usize,
    pub save_failures: usize,
    pub forbidden_notes: usize,
}

impl PlacementOutcome {
    pub fn matched(&self) -> bool {
        matches!(self.placement, Placement::MatchFolder(_))
    }
}

/// File name for a saved candidate: the last segment of its URL
pub fn link_title(link: &str) -> &str {
    match link.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => "image",
    }
}

/// Persist larger candidates and move the source file exactly once.
///
/// The per-source folder is created as soon as the first larger candidate
/// shows up. A candidate or note that cannot be written is reported and
/// skipped; the source is still moved.
pub fn place(
    file_name: &OsStr,
    evaluations: Vec<Evaluation>,
    targets: &PlacementTargets,
    reporter: &dyn Reporter,
) -> Result<PlacementOutcome> {
    let mut match_dir: Option<PathBuf> = None;
    let mut saved = 0;
    let mut save_failures = 0;
    let mut forbidden_notes = 0;
    let mut note_attempted = false;

    for evaluation in evaluations {
        let Evaluation {
            link,
            forbidden,
            verdict,
        } = evaluation;

        match verdict {
            Verdict::Invalid { reason } => {
                reporter.report(&Event::InvalidLink { link, reason });
            }
            Verdict::TooSmall { dimensions } => {
                reporter.report(&Event::SkippedSmaller { link, dimensions });
            }
            Verdict::Larger { dimensions, bytes } => {
                let dir = match &match_dir {
                    Some(dir) => dir.clone(),
                    None => {
                        let dir = targets
                            .output_dir
                            .join(fileops::source_folder_name(file_name));
                        fileops::create_folder(&dir)?;
                        match_dir = Some(dir.clone());
                        dir
                    }
                };

                let title = link_title(&link);
                match fileops::save_bytes(&dir, title, &bytes, &targets.save) {
                    Ok(path) => {
                        saved += 1;
                        reporter.report(&Event::Saved {
                            title: file_label(&path, title),
                            dimensions,
                        });
                        if forbidden && !note_attempted {
                            note_attempted = true;
                            match fileops::write_marker_file(&dir, &targets.forbidden_note) {
                                Ok(_) => {
                                    forbidden_notes += 1;
                                    reporter.report(&Event::ForbiddenNote { folder: dir.clone() });
                                }
                                Err(e) => reporter.report(&Event::NoteFailed {
                                    folder: dir.clone(),
                                    error: e.to_string(),
                                }),
                            }
                        }
                    }
                    Err(e) => {
                        save_failures += 1;
                        reporter.report(&Event::SaveFailed {
                            link,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
    }

    let (placement, destination) = match match_dir {
        Some(dir) => (Placement::MatchFolder(dir.clone()), dir),
        None => (
            Placement::NoMatch(targets.no_match_dir.clone()),
            targets.no_match_dir.clone(),
        ),
    };

    let original = fileops::move_file(file_name, &targets.input_dir, &destination)?;
    reporter.report(&Event::Moved {
        filename: file_name.to_string_lossy().into_owned(),
        destination,
    });

    Ok(PlacementOutcome {
        placement,
        original,
        saved,
        save_failures,
        forbidden_notes,
    })
}

fn file_label(path: &Path, fallback: &str) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}
