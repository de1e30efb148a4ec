#![allow(unused)]
//! Ingestion supervisor integration harness.
//!
//! # What this covers
//!
//! - **Multi-file determinism**: the same lines split across several files
//!   give the same totals as one file.
//! - **Enumerate once**: files created after start-up are ignored unless
//!   `follow_new_files` is on.
//! - **Follow new files**: with the watcher enabled a new file is tailed.
//! - **Report**: per-file summaries come back when the run is cancelled.
//! - **Discovery errors**: a missing traces directory fails the run.
//!
//! # What this does NOT cover
//!
//! - The isolate/abort policy on a failing tailer (unit tests in
//!   `tracewatch-feeds`; a readable-then-failing file is not reproducible
//!   portably)
//!
//! # Running
//!
//! ```sh
//! cargo test --test ingest_harness
//! ```

mod common;
use common::*;

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracewatch_core::config::IngestConfig;
use tracewatch_core::Aggregator;
use tracewatch_feeds::{IngestError, IngestReport, Ingestor};

const WAIT: Duration = Duration::from_secs(5);

fn config(dir: &TraceDir) -> IngestConfig {
    IngestConfig {
        traces_dir: dir.path().to_path_buf(),
        poll_interval_ms: 10,
        ..IngestConfig::default()
    }
}

struct Running {
    aggregator: Arc<Aggregator>,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<Result<IngestReport, IngestError>>,
}

impl Running {
    fn start(config: IngestConfig) -> Self {
        let aggregator = Arc::new(Aggregator::new());
        let cancel = CancellationToken::new();
        let ingestor = Ingestor::new(config, aggregator.clone(), cancel.clone());
        let handle = tokio::spawn(ingestor.run());
        Self { aggregator, cancel, handle }
    }

    async fn stop(self) -> IngestReport {
        self.cancel.cancel();
        self.handle.await.expect("ingest task").expect("ingest result")
    }
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn walkthrough_across_files() {
    let dir = TraceDir::new();
    let lines = walkthrough();
    dir.write("a-publisher.json", &lines[..1]);
    dir.write("b-subscriber.json", &lines[1..2]);
    dir.write("c-noise.json", &noise());
    dir.write("d-dups.json", &lines[2..]);

    let run = Running::start(config(&dir));
    let agg = run.aggregator.clone();
    assert!(eventually(WAIT, || agg.snapshot().duplicate_messages == 1
        && agg.snapshot().delivered_messages == 1
        && agg.snapshot().published_messages == 1)
    .await);

    let snap = agg.snapshot();
    assert_counts!(snap, peers: 2, published: 1, delivered: 1, duplicates: 1);
    assert_avg_delay!(snap, 500);

    let report = run.stop().await;
    assert_eq!(report.tailers.len(), 4);
    assert!(report.failures.is_empty());
    assert_eq!(report.total_lines(), 3 + noise().len() as u64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_files_match_single_file_totals() {
    let dir = TraceDir::new();
    let mut all = Vec::new();
    for p in 0..6 {
        let pubs = publisher(&format!("pub-{p}"), p * 50, 40, 1_000);
        let subs = subscriber(&format!("sub-{p}"), p * 50, 40, 1_000, 750 * (p as i64 + 1));
        dir.write(&format!("pub-{p}.json"), &pubs);
        dir.write(&format!("sub-{p}.json"), &subs);
        all.extend(pubs);
        all.extend(subs);
    }

    let reference = Aggregator::new();
    for line in &all {
        reference.ingest_line(line.as_bytes()).unwrap();
    }
    let expected = reference.snapshot();

    let run = Running::start(config(&dir));
    let agg = run.aggregator.clone();
    assert!(eventually(WAIT, || agg.snapshot().same_counts(&expected)).await);
    let report = run.stop().await;
    assert_eq!(report.tailers.len(), 12);
    assert_eq!(report.total_lines(), all.len() as u64);
}

// ---------------------------------------------------------------------------
// New files
// ---------------------------------------------------------------------------

#[tokio::test]
async fn files_created_later_are_ignored_by_default() {
    let dir = TraceDir::new();
    dir.write("early.json", &[duplicate("A")]);

    let run = Running::start(config(&dir));
    let agg = run.aggregator.clone();
    assert!(eventually(WAIT, || agg.snapshot().duplicate_messages == 1).await);

    dir.write("late.json", &[duplicate("B")]);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_counts!(agg.snapshot(), peers: 1, duplicates: 1);

    let report = run.stop().await;
    assert_eq!(report.tailers.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn follow_new_files_tails_created_file() {
    let dir = TraceDir::new();
    dir.write("early.json", &[duplicate("A")]);

    let run = Running::start(IngestConfig { follow_new_files: true, ..config(&dir) });
    let agg = run.aggregator.clone();
    assert!(eventually(WAIT, || agg.snapshot().duplicate_messages == 1).await);

    dir.write("late.json", &[duplicate("B")]);
    assert!(eventually(WAIT, || agg.snapshot().duplicate_messages == 2).await);
    assert_counts!(agg.snapshot(), peers: 2);

    let report = run.stop().await;
    assert_eq!(report.tailers.len(), 2);
}

#[tokio::test]
async fn empty_directory_runs_until_cancelled() {
    let dir = TraceDir::new();
    let run = Running::start(config(&dir));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!run.handle.is_finished());
    let report = run.stop().await;
    assert!(report.tailers.is_empty());
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_directory_fails_discovery() {
    let dir = TraceDir::new();
    let cfg = IngestConfig { traces_dir: dir.path().join("nope"), ..config(&dir) };
    let run = Running::start(cfg);
    let err = run.handle.await.unwrap().unwrap_err();
    assert!(matches!(err, IngestError::Discover { .. }));
    assert!(err.to_string().contains("nope"));
}
