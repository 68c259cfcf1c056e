//! Fan-out/fan-in hashing pool.
//!
//! - Tasks go to workers over an unbounded crossbeam channel.
//! - Each worker hashes, bumps the shared progress counter, and sends one
//!   `ResultRecord` per task on the result channel.
//! - A supervisor thread joins every worker and only then drops the last
//!   result sender, so a consumer draining the channel sees every record
//!   before it sees the channel close.

use crate::backends::{ChecksumError, StorageBackend};
use crate::hasher::sha256_file;
use crossbeam_channel::{unbounded, Receiver};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// A file to hash. Consumed by exactly one worker.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub path: PathBuf,
}

impl FileTask {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Outcome of one task. `digest` is `None` when hashing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub display_name: String,
    pub digest: Option<String>,
}

impl ResultRecord {
    pub fn is_failure(&self) -> bool {
        self.digest.is_none()
    }
}

/// How completions are shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Bar,
    /// One `Progress: done/total` line per completion.
    Lines,
    Hidden,
}

/// Completed-task counter shared by all workers.
pub struct Progress {
    done: AtomicUsize,
    total: usize,
    mode: ProgressMode,
    bar: Option<ProgressBar>,
}

impl Progress {
    pub fn new(total: usize, mode: ProgressMode) -> Self {
        let bar = if mode == ProgressMode::Bar {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} hashed ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
            );
            Some(pb)
        } else {
            None
        };
        Self {
            done: AtomicUsize::new(0),
            total,
            mode,
            bar,
        }
    }

    /// Record one finished task and return the new count.
    pub fn complete(&self) -> usize {
        let done = self.done.fetch_add(1, Ordering::AcqRel) + 1;
        match (&self.bar, self.mode) {
            (Some(pb), _) => pb.inc(1),
            (None, ProgressMode::Lines) => println!("Progress: {}/{}", done, self.total),
            _ => {}
        }
        done
    }

    pub fn done(&self) -> usize {
        self.done.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn finish(&self, msg: &'static str) {
        if let Some(pb) = &self.bar {
            pb.finish_with_message(msg);
        }
    }
}

/// Running pool: drain `results`, then call `join`.
pub struct PoolHandle {
    pub results: Receiver<ResultRecord>,
    supervisor: Option<thread::JoinHandle<()>>,
}

impl PoolHandle {
    /// Wait for the supervisor. Returns immediately once `results` has closed.
    pub fn join(self) {
        if let Some(supervisor) = self.supervisor {
            if supervisor.join().is_err() {
                log::error!("Pool supervisor panicked");
            }
        }
    }
}

pub struct WorkerPool {
    threads: usize,
    stack_size: Option<usize>,
}

impl WorkerPool {
    /// `threads == 0` spawns one worker per task.
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            stack_size: None,
        }
    }

    /// Stack size for worker threads. Defaults to the platform's.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    fn worker_count(&self, tasks: usize) -> usize {
        if self.threads == 0 {
            tasks
        } else {
            self.threads.min(tasks)
        }
    }

    /// Start hashing `tasks`.
    ///
    /// If the OS refuses a thread, spawning stops and the workers already
    /// running drain the whole task queue. Fails only when not a single
    /// worker could be started for a non-empty batch.
    pub fn spawn(
        &self,
        backend: Arc<dyn StorageBackend + Send + Sync>,
        tasks: Vec<FileTask>,
        progress: Arc<Progress>,
    ) -> Result<PoolHandle, ChecksumError> {
        let pending = tasks.len();
        let workers = self.worker_count(pending);

        let (task_tx, task_rx) = unbounded::<FileTask>();
        for task in tasks {
            // The receiver is held locally, so this cannot fail.
            let _ = task_tx.send(task);
        }
        drop(task_tx);

        let (result_tx, result_rx) = unbounded::<ResultRecord>();
        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let backend = Arc::clone(&backend);
            let progress = Arc::clone(&progress);
            let mut builder = thread::Builder::new().name(format!("hash-worker-{}", i));
            if let Some(bytes) = self.stack_size {
                builder = builder.stack_size(bytes);
            }
            let spawned = builder.spawn(move || {
                while let Ok(task) = task_rx.recv() {
                    let record = hash_task(backend.as_ref(), &task);
                    progress.complete();
                    if result_tx.send(record).is_err() {
                        log::warn!("Result receiver dropped; worker {} stopping", i);
                        break;
                    }
                }
                log::info!("Worker {} exiting", i);
            });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) if handles.is_empty() => {
                    log::error!("Failed to spawn any hash worker: {}", e);
                    return Err(ChecksumError::Spawn(e));
                }
                Err(e) => {
                    log::warn!(
                        "Failed to spawn hash worker {}: {}; continuing with {} workers",
                        i,
                        e,
                        handles.len()
                    );
                    break;
                }
            }
        }
        drop(task_rx);

        // Workers drop their senders on exit, so the channel still closes
        // after the last one finishes if the supervisor cannot start.
        let supervisor = thread::Builder::new()
            .name("hash-supervisor".to_string())
            .spawn(move || {
                for (i, handle) in handles.into_iter().enumerate() {
                    if handle.join().is_err() {
                        log::error!("Worker thread {} panicked", i);
                    } else {
                        log::info!("Joined worker thread {}", i);
                    }
                }
                drop(result_tx);
            });
        let supervisor = match supervisor {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Failed to spawn pool supervisor: {}; workers run detached", e);
                None
            }
        };

        Ok(PoolHandle {
            results: result_rx,
            supervisor,
        })
    }
}

fn hash_task(backend: &dyn StorageBackend, task: &FileTask) -> ResultRecord {
    let display_name = task.display_name();
    match sha256_file(backend, &task.path) {
        Ok(digest) => ResultRecord {
            display_name,
            digest: Some(digest),
        },
        Err(e) => {
            log::error!("{}", e);
            ResultRecord {
                display_name,
                digest: None,
            }
        }
    }
}
