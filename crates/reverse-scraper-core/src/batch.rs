//! Batch orchestration over the input folder.
//!
//! Parallel mode fans files out over a rayon pool sized to the physical core
//! count. Only the calling thread touches the progress bar; workers hand
//! their reports back over a channel. The first fatal error stops the run:
//! files not yet started are left in the input folder.

use crossbeam::channel;
use log::{error, info, warn};
use std::ffi::OsString;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use crate::config::Config;
use crate::discovery::list_input_images;
use crate::error::{Error, Result};
use crate::fileops::{create_folder, resolve_base};
use crate::pipeline::{process_file, PipelineContext};
use crate::progress::ProgressTracker;
use crate::report::{ConsoleReporter, LogReporter, Reporter};
use crate::session::SearchSession;
use crate::types::{BatchSummary, FileReport, RunMode, Workspace};

/// Resolve the input and output folders and make sure the output side exists
pub fn prepare_workspace(config: &Config) -> Result<Workspace> {
    let input_dir = resolve_base(&config.input_dir)?;
    let output_dir = resolve_base(&config.output_dir)?;
    let no_match_dir = create_folder(&output_dir.join(&config.no_match_folder))?;

    Ok(Workspace {
        input_dir,
        output_dir,
        no_match_dir,
    })
}

/// Process every image in the input folder.
///
/// `open_session` is called once per file in parallel mode and once per run
/// in single mode.
pub fn run_batch<S, F>(
    config: &Config,
    mode: RunMode,
    links: usize,
    open_session: F,
) -> Result<BatchSummary>
where
    S: SearchSession,
    F: Fn() -> Result<S> + Sync,
{
    let start = Instant::now();
    let workspace = prepare_workspace(config)?;
    let files = list_input_images(&workspace.input_dir)?;
    let ctx = PipelineContext::new(config, &workspace, links);

    info!(
        "Starting {:?} run over {} files, {} links per file",
        mode,
        files.len(),
        links
    );

    let mut summary = match mode {
        RunMode::Single => run_single(&ctx, &files, &open_session)?,
        RunMode::Parallel => run_parallel(&ctx, &files, &open_session, config.worker_count())?,
    };

    summary.elapsed = start.elapsed();
    info!("{}", summary);
    Ok(summary)
}

fn run_single<S, F>(
    ctx: &PipelineContext,
    files: &[OsString],
    open_session: &F,
) -> Result<BatchSummary>
where
    S: SearchSession,
    F: Fn() -> Result<S>,
{
    let session = open_session()?;
    let reporter = ConsoleReporter;
    let mut summary = BatchSummary::default();

    for file in files {
        let label = format!("[*] {}", file.to_string_lossy());
        println!("{}", console::style(label).cyan());
        let report = process_file(&session, ctx, &reporter, file)?;
        summary.record(&report);
    }

    Ok(summary)
}

fn run_parallel<S, F>(
    ctx: &PipelineContext,
    files: &[OsString],
    open_session: &F,
    workers: usize,
) -> Result<BatchSummary>
where
    S: SearchSession,
    F: Fn() -> Result<S> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| Error::Unknown(format!("Failed to build thread pool: {}", e)))?;
    info!("Using {} workers", workers);

    let abort = AtomicBool::new(false);
    let not_started = AtomicUsize::new(0);
    let reporter = LogReporter;
    let mut tracker = ProgressTracker::new(files.len());
    let mut summary = BatchSummary::default();
    let mut failure: Option<Error> = None;

    pool.in_place_scope(|scope| {
        let (tx, rx) = channel::unbounded::<Result<FileReport>>();

        for file in files {
            let tx = tx.clone();
            let abort = &abort;
            let not_started = &not_started;
            let reporter = &reporter;
            scope.spawn(move |_| {
                if abort.load(Ordering::SeqCst) {
                    not_started.fetch_add(1, Ordering::SeqCst);
                    return;
                }
                let result =
                    open_session().and_then(|session| process_file(&session, ctx, reporter, file));
                let _ = tx.send(result);
            });
        }
        drop(tx);

        for result in rx {
            match result {
                Ok(report) => {
                    tracker.increment(&report);
                    summary.record(&report);
                }
                Err(e) => {
                    error!("Fatal error, stopping run: {}", e);
                    abort.store(true, Ordering::SeqCst);
                    tracker.abandon(&e.to_string());
                    failure = Some(e);
                    break;
                }
            }
        }
    });

    if let Some(e) = failure {
        warn!(
            "{} files were not started and remain in the input folder",
            not_started.load(Ordering::SeqCst)
        );
        return Err(e);
    }

    tracker.finish();
    Ok(summary)
}
