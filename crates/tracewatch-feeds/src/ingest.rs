//! Ingestion supervisor — discovers trace files, runs one [`Tailer`] per
//! file, and decides what a tailer failure means for the rest.
//!
//! The directory is listed once at start-up. Files created later are only
//! picked up when `follow_new_files` is enabled, in which case a `notify`
//! watcher reports creations and the supervisor starts a tailer for each new
//! regular file.

use crate::error::{IngestError, TailError};
use crate::tailer::{TailSummary, Tailer};
use notify::{EventKind, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracewatch_core::config::{FailurePolicy, IngestConfig};
use tracewatch_core::Aggregator;

type TailResult = Result<TailSummary, TailError>;

/// Outcome of a finished ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// One entry per tailer that stopped cleanly.
    pub tailers: Vec<TailSummary>,
    /// Tailers that failed while the policy was [`FailurePolicy::Isolate`].
    pub failures: Vec<TailError>,
}

impl IngestReport {
    pub fn total_lines(&self) -> u64 {
        self.tailers.iter().map(|t| t.lines).sum()
    }
}

/// Owns the tailer tasks for one traces directory.
pub struct Ingestor {
    config: IngestConfig,
    aggregator: Arc<Aggregator>,
    cancel: CancellationToken,
}

impl Ingestor {
    pub fn new(config: IngestConfig, aggregator: Arc<Aggregator>, cancel: CancellationToken) -> Self {
        Self { config, aggregator, cancel }
    }

    /// Run until the cancellation token fires, or until a tailer fails under
    /// [`FailurePolicy::Abort`].
    pub async fn run(self) -> Result<IngestReport, IngestError> {
        let dir = self.config.traces_dir.clone();

        // Watch before listing; `spawn_tailer` skips paths it already has.
        let (created_tx, mut created_rx) = mpsc::unbounded_channel();
        let _watcher = if self.config.follow_new_files {
            Some(watch_creations(&dir, created_tx)?)
        } else {
            drop(created_tx);
            None
        };

        let files = discover(&dir)?;
        tracing::info!(dir = %dir.display(), files = files.len(), "starting ingestion");

        let mut tailers = Tailers::default();
        for path in files {
            self.spawn_tailer(&mut tailers, path);
        }

        let mut report = IngestReport::default();
        let mut watching = self.config.follow_new_files;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                created = created_rx.recv(), if watching => {
                    match created {
                        Some(path) if is_regular_file(&path) => {
                            self.spawn_tailer(&mut tailers, path);
                        }
                        Some(_) => {}
                        None => watching = false,
                    }
                }
                Some(result) = tailers.join_next() => {
                    if let Some(err) = self.record(result, &mut report) {
                        self.cancel.cancel();
                        tailers.drain(&mut report).await;
                        return Err(IngestError::Aborted(err));
                    }
                }
            }
        }

        tailers.drain(&mut report).await;
        tracing::info!(
            tailers = report.tailers.len(),
            failures = report.failures.len(),
            lines = report.total_lines(),
            "ingestion stopped"
        );
        Ok(report)
    }

    fn spawn_tailer(&self, tailers: &mut Tailers, path: PathBuf) {
        if !tailers.known.insert(path.clone()) {
            return;
        }
        tracing::info!(path = %path.display(), "tailing");
        let tailer = Tailer::new(
            path.clone(),
            self.aggregator.clone(),
            self.config.poll_interval(),
            self.cancel.clone(),
        );
        let handle = tailers.tasks.spawn(tailer.run());
        tailers.by_task.insert(handle.id(), path);
    }

    /// File a finished tailer's result. Returns the error when the policy
    /// says ingestion must stop.
    fn record(&self, result: TailResult, report: &mut IngestReport) -> Option<TailError> {
        match result {
            Ok(summary) => report.tailers.push(summary),
            Err(err) => {
                tracing::error!(path = %err.path.display(), error = %err.source, "tailer failed");
                match self.config.on_tailer_error {
                    FailurePolicy::Isolate => report.failures.push(err),
                    FailurePolicy::Abort => return Some(err),
                }
            }
        }
        None
    }
}

/// Running tailer tasks, keyed back to the file each one follows.
#[derive(Default)]
struct Tailers {
    tasks: JoinSet<TailResult>,
    known: HashSet<PathBuf>,
    by_task: HashMap<task::Id, PathBuf>,
}

impl Tailers {
    /// Wait for the next tailer to finish. A panicked task counts as a
    /// failure of its file.
    async fn join_next(&mut self) -> Option<TailResult> {
        let joined = self.tasks.join_next_with_id().await?;
        Some(match joined {
            Ok((id, result)) => {
                self.by_task.remove(&id);
                result
            }
            Err(join_err) => {
                let path = self.by_task.remove(&join_err.id()).unwrap_or_default();
                Err(TailError {
                    path,
                    source: std::io::Error::other(format!("tailer task failed: {join_err}")),
                })
            }
        })
    }

    async fn drain(&mut self, report: &mut IngestReport) {
        while let Some(result) = self.join_next().await {
            match result {
                Ok(summary) => report.tailers.push(summary),
                Err(err) => report.failures.push(err),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// List the regular files directly inside `dir`, sorted by path.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let to_err = |source| IngestError::Discover { path: dir.to_path_buf(), source };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(to_err)? {
        let entry = entry.map_err(to_err)?;
        let path = entry.path();
        if is_regular_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_regular_file(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

fn watch_creations(
    dir: &Path,
    tx: mpsc::UnboundedSender<PathBuf>,
) -> Result<notify::RecommendedWatcher, IngestError> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) if matches!(event.kind, EventKind::Create(_)) => {
                for path in event.paths {
                    let _ = tx.send(path);
                }
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "directory watch error"),
        }
    })?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    tracing::info!(dir = %dir.display(), "watching for new trace files");
    Ok(watcher)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
