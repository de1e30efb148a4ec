//! Reporter — periodically reads a [`Snapshot`] and hands it to a sink.
//!
//! Sinks are pure consumers: they never see the [`Aggregator`] itself, only
//! the copies it produces. The reporter waits `warmup` before the first tick,
//! then emits every `interval` until the cancellation token fires, and emits
//! one final snapshot on the way out.

use crate::aggregator::{Aggregator, Snapshot};
use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

const RULE: &str = "=====================";

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Consumer of periodic snapshots.
pub trait SnapshotSink: Send {
    fn emit(&mut self, snapshot: &Snapshot) -> anyhow::Result<()>;
}

impl<F> SnapshotSink for F
where
    F: FnMut(&Snapshot) -> anyhow::Result<()> + Send,
{
    fn emit(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        self(snapshot)
    }
}

/// Writes a framed text block per snapshot.
pub struct ConsoleSink<W> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: std::io::stdout() }
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> SnapshotSink for ConsoleSink<W> {
    fn emit(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        self.out.write_all(render_console(snapshot).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Render the console block for one snapshot.
pub fn render_console(s: &Snapshot) -> String {
    let delay = match s.average_delay_ms() {
        Some(ms) => format!("{ms:.3} ms"),
        None => "n/a".to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Snapshot at {}", s.taken_at.format("%H:%M:%S"));
    let _ = writeln!(out, "Peers: {}", s.peers);
    let _ = writeln!(out, "Topics: {}", s.topics);
    let _ = writeln!(out, "Published: {}", s.published_messages);
    let _ = writeln!(out, "Delivered: {}", s.delivered_messages);
    let _ = writeln!(out, "Duplicates: {}", s.duplicate_messages);
    let _ = writeln!(out, "Sent RPCs: {}", s.sent_rpcs);
    let _ = writeln!(out, "Average delay: {delay} ({} samples)", s.delay_samples);
    let _ = writeln!(out, "{RULE}");
    out
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Periodic snapshot pump.
pub struct Reporter {
    aggregator: Arc<Aggregator>,
    interval: Duration,
    warmup: Duration,
}

impl Reporter {
    pub fn new(aggregator: Arc<Aggregator>, interval: Duration) -> Self {
        Self { aggregator, interval, warmup: Duration::ZERO }
    }

    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Run until `cancel` fires. Returns the number of snapshots emitted,
    /// including the final flush.
    pub async fn run<S: SnapshotSink>(self, mut sink: S, cancel: CancellationToken) -> u64 {
        let mut emitted = 0u64;

        let warmed_up = tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.warmup) => true,
        };

        if warmed_up {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        self.emit(&mut sink);
                        emitted += 1;
                    }
                }
            }
        }

        tracing::debug!("reporter cancelled; flushing final snapshot");
        self.emit(&mut sink);
        emitted + 1
    }

    fn emit<S: SnapshotSink>(&self, sink: &mut S) {
        let snapshot = self.aggregator.snapshot();
        if let Err(err) = sink.emit(&snapshot) {
            tracing::warn!(error = %err, "snapshot sink failed");
        }
    }
}
