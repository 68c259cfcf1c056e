/// Project overview:
/// - Hashes every file directly inside a directory with SHA-256, in parallel
/// - Writes the results as a markdown table to `SHA256.md` in that directory
/// - Uses a fan-out/fan-in model: worker threads hash, one loop aggregates
/// - Include/exclude filtering via Regex on file names
/// - Concurrency is tunable; progress reporting can be a bar or plain lines
///
/// Key behaviors:
/// - Subdirectories and the report file itself (any case) are never hashed
/// - A file that fails to hash is logged, counted as done, and left out of the table
/// - Only an unreadable directory or a failed report write aborts the run
///
/// Flags:
/// - threads: worker count, 0 for one worker per file
/// - dry_run: build the table but do not write it
/// - no_progress: plain progress lines instead of a progress bar
/// - quiet: no progress output at all
/// - sort: order rows by file name instead of completion order
pub mod backends;
pub mod hasher;
pub mod pool;
pub mod report;
pub mod utils;

pub use backends::{ChecksumError, FileEntry, LocalBackend, StorageBackend};
pub use pool::{FileTask, Progress, ProgressMode, ResultRecord, WorkerPool};
pub use report::{write_report, Report};
pub use utils::REPORT_FILE_NAME;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ChecksumOptions<'a> {
    pub threads: usize,
    pub include: Option<&'a regex::Regex>,
    pub exclude: Option<&'a regex::Regex>,
    pub dry_run: bool,
    pub no_progress: bool,
    pub quiet: bool,
    pub sort: bool,
}

impl ChecksumOptions<'_> {
    pub fn progress_mode(&self) -> ProgressMode {
        if self.quiet {
            ProgressMode::Hidden
        } else if self.no_progress {
            ProgressMode::Lines
        } else {
            ProgressMode::Bar
        }
    }
}

impl Default for ChecksumOptions<'_> {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            include: None,
            exclude: None,
            dry_run: false,
            no_progress: false,
            quiet: false,
            sort: false,
        }
    }
}

/// Pipeline stages, in order. `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Dispatching,
    AwaitingCompletion,
    Aggregating,
    Writing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::Dispatching => "dispatching",
            Stage::AwaitingCompletion => "awaiting completion",
            Stage::Aggregating => "aggregating",
            Stage::Writing => "writing",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(s)
    }
}

fn enter(stages: &mut Vec<Stage>, stage: Stage) {
    log::debug!("Pipeline stage: {}", stage);
    stages.push(stage);
}

/// Result of a completed run.
#[derive(Debug)]
pub struct Summary {
    pub report: Report,
    /// Eligible files handed to the pool.
    pub total: usize,
    /// Final progress counter value.
    pub completed: usize,
    /// Files that could not be hashed.
    pub failed: usize,
    /// Stages passed through, in order.
    pub stages: Vec<Stage>,
}

/// Eligible files directly inside `dir`, in listing order.
pub fn eligible_files(
    backend: &dyn StorageBackend,
    dir: &Path,
    options: &ChecksumOptions,
) -> Result<Vec<FileTask>, ChecksumError> {
    let entries = backend.list(dir)?;
    Ok(entries
        .into_iter()
        .filter(|entry| {
            if entry.is_dir() {
                return false;
            }
            let name = entry.name();
            !utils::is_report_file(&name)
                && utils::passes_filters(&name, options.include, options.exclude)
        })
        .map(|entry| FileTask::new(entry.path))
        .collect())
}

/// Hash every eligible file in `dir` and aggregate the table. Writes nothing.
/// The returned stages stop at `Aggregating`.
pub fn checksum_dir(
    backend: Arc<dyn StorageBackend + Send + Sync>,
    dir: &Path,
    options: &ChecksumOptions,
) -> Result<Summary, ChecksumError> {
    let mut stages = Vec::new();
    enter(&mut stages, Stage::Idle);
    enter(&mut stages, Stage::Dispatching);
    let tasks = match eligible_files(backend.as_ref(), dir, options) {
        Ok(tasks) => tasks,
        Err(e) => {
            enter(&mut stages, Stage::Failed);
            return Err(e);
        }
    };
    let total = tasks.len();
    log::info!("Hashing {} files in {}", total, dir.display());

    let progress = Arc::new(Progress::new(total, options.progress_mode()));
    let handle =
        match WorkerPool::new(options.threads).spawn(backend, tasks, Arc::clone(&progress)) {
            Ok(handle) => handle,
            Err(e) => {
                progress.finish("Hashing aborted");
                enter(&mut stages, Stage::Failed);
                return Err(e);
            }
        };

    // The receive loop aggregates while it waits; it ends when the pool
    // closes the channel after joining every worker.
    enter(&mut stages, Stage::AwaitingCompletion);
    enter(&mut stages, Stage::Aggregating);
    let (mut report, failed) = Report::collect(&handle.results);
    handle.join();
    progress.finish("Hashing complete");

    if options.sort {
        report.sort_by_name();
    }

    Ok(Summary {
        report,
        total,
        completed: progress.done(),
        failed,
        stages,
    })
}

/// Where the report for `dir` is written.
pub fn report_path(dir: &Path) -> PathBuf {
    dir.join(REPORT_FILE_NAME)
}

/// Full run: hash `dir`, then write `dir/SHA256.md` unless `dry_run` is set.
pub fn run(
    backend: Arc<dyn StorageBackend + Send + Sync>,
    dir: &Path,
    options: &ChecksumOptions,
) -> Result<Summary, ChecksumError> {
    let mut summary = checksum_dir(Arc::clone(&backend), dir, options)?;

    if options.dry_run {
        enter(&mut summary.stages, Stage::Done);
        return Ok(summary);
    }

    enter(&mut summary.stages, Stage::Writing);
    if let Err(e) = write_report(backend.as_ref(), &report_path(dir), &summary.report) {
        enter(&mut summary.stages, Stage::Failed);
        return Err(e);
    }
    enter(&mut summary.stages, Stage::Done);
    Ok(summary)
}
