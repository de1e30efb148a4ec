//! Process wiring: one aggregator, the ingestion supervisor, and whichever
//! sink the configuration selects, all tied to one cancellation token.

use crate::server::{self, ServerState};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracewatch_core::{
    config::{Config, ReportMode},
    report::{ConsoleSink, Reporter, SnapshotSink},
    Aggregator,
};
use tracewatch_feeds::Ingestor;

/// Run until `cancel` fires or a task fails. The first failure cancels
/// everything else and is returned once every task has stopped.
pub async fn run(config: Config, cancel: CancellationToken) -> anyhow::Result<()> {
    let aggregator = Arc::new(Aggregator::new());
    run_with(config, aggregator, cancel).await
}

/// Like [`run`], over a caller-owned aggregator.
pub async fn run_with(
    config: Config,
    aggregator: Arc<Aggregator>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!(
        dir = %config.ingest.traces_dir.display(),
        mode = ?config.report.mode,
        interval = ?config.report.interval(),
        "tracewatch starting"
    );

    let mut tasks: JoinSet<anyhow::Result<()>> = JoinSet::new();

    let ingestor = Ingestor::new(config.ingest.clone(), aggregator.clone(), cancel.clone());
    tasks.spawn(async move {
        let report = ingestor.run().await?;
        if !report.failures.is_empty() {
            tracing::warn!(failed = report.failures.len(), "some trace files could not be read");
        }
        Ok(())
    });

    let reporter = Reporter::new(aggregator.clone(), config.report.interval())
        .with_warmup(config.report.warmup());

    match config.report.mode {
        ReportMode::Console => {
            spawn_reporter(&mut tasks, reporter, ConsoleSink::stdout(), cancel.clone());
        }
        ReportMode::Server => {
            let state = ServerState::new(aggregator.clone(), cancel.clone());
            spawn_reporter(&mut tasks, reporter, state.sink(), cancel.clone());
            let listen = config.server.listen.clone();
            tasks.spawn(async move { server::serve(state, &listen).await });
        }
        ReportMode::Dashboard => {
            // The dashboard pulls its own snapshots on the report interval.
            let ui = config.ui.clone();
            let refresh = config.report.interval();
            let cancel = cancel.clone();
            tasks.spawn_blocking(move || tracewatch_tui::run(aggregator, &ui, refresh, cancel));
        }
    }

    let mut first_err: Option<anyhow::Error> = None;
    while let Some(joined) = tasks.join_next().await {
        let result = joined.map_err(anyhow::Error::from).and_then(|r| r);
        if let Err(err) = result {
            tracing::error!(error = %err, "task failed; shutting down");
            cancel.cancel();
            first_err.get_or_insert(err);
        }
    }

    tracing::info!("tracewatch stopped");
    match first_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn spawn_reporter<S>(
    tasks: &mut JoinSet<anyhow::Result<()>>,
    reporter: Reporter,
    sink: S,
    cancel: CancellationToken,
) where
    S: SnapshotSink + 'static,
{
    tasks.spawn(async move {
        let emitted = reporter.run(sink, cancel).await;
        tracing::debug!(emitted, "reporter stopped");
        Ok(())
    });
}
