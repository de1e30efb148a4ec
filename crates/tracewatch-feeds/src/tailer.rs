//! Tailer — follows one growing trace file and feeds its lines to the
//! aggregator.
//!
//! The tailer reads from offset 0. When it catches up with the file (EOF, or
//! a trailing line with no terminator yet) it sleeps for the poll interval
//! and tries again; "no data yet" never ends it. Partial lines stay buffered
//! until their `\n` arrives. Any other I/O error ends this tailer only and is
//! returned as a [`TailError`].

use crate::error::TailError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracewatch_core::Aggregator;

/// Counters returned when a tailer stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailSummary {
    pub path: PathBuf,
    /// Complete lines read, blank and malformed ones included.
    pub lines: u64,
    /// Facts applied to the aggregator.
    pub facts: u64,
    /// Lines the classifier rejected.
    pub malformed: u64,
}

/// Follows one file. Build with [`Tailer::new`], start with [`Tailer::run`].
pub struct Tailer {
    path: PathBuf,
    aggregator: Arc<Aggregator>,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl Tailer {
    pub fn new(
        path: impl Into<PathBuf>,
        aggregator: Arc<Aggregator>,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self { path: path.into(), aggregator, poll_interval, cancel }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Tail the file until the cancellation token fires.
    pub async fn run(self) -> Result<TailSummary, TailError> {
        let file = File::open(&self.path).await.map_err(|source| self.fail(source))?;
        let mut reader = BufReader::new(file);
        let mut summary = TailSummary { path: self.path.clone(), ..TailSummary::default() };
        let mut buf = Vec::with_capacity(4096);

        tracing::debug!(path = %self.path.display(), "tailer started");

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            // `read_until` appends, so a partial line left over from the
            // previous attempt is completed in place.
            let read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|source| self.fail(source))?;

            if read == 0 || buf.last() != Some(&b'\n') {
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.poll_interval) => continue,
                }
            }

            summary.lines += 1;
            self.handle_line(trim_line(&buf), &mut summary);
            buf.clear();
        }

        tracing::debug!(
            path = %self.path.display(),
            lines = summary.lines,
            facts = summary.facts,
            malformed = summary.malformed,
            "tailer stopped"
        );
        Ok(summary)
    }

    fn handle_line(&self, line: &[u8], summary: &mut TailSummary) {
        match self.aggregator.ingest_line(line) {
            Ok(n) => summary.facts += n as u64,
            Err(err) => {
                summary.malformed += 1;
                tracing::debug!(
                    path = %self.path.display(),
                    line = summary.lines,
                    error = %err,
                    "dropping malformed trace line"
                );
            }
        }
    }

    fn fail(&self, source: std::io::Error) -> TailError {
        TailError { path: self.path.clone(), source }
    }
}

fn trim_line(buf: &[u8]) -> &[u8] {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    line.strip_suffix(b"\r").unwrap_or(line)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
