//! tracewatch TUI — live dashboard over the shared aggregator.

pub mod app;
pub mod commands;
pub mod event;
pub mod theme;
pub mod widgets;

pub use app::App;

use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracewatch_core::{config::UiConfig, Aggregator};

/// Run the dashboard on the calling thread until the user quits or `cancel`
/// fires. Quitting cancels `cancel` so ingestion stops with it.
///
/// Blocks; call it from `spawn_blocking` inside a tokio runtime.
pub fn run(
    aggregator: Arc<Aggregator>,
    ui: &UiConfig,
    refresh_every: Duration,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!(theme = %ui.theme, ?refresh_every, "starting dashboard");
    App::new(aggregator, ui, refresh_every, cancel).run()
}
