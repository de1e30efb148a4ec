//! Command-line interface. Flags override the layered configuration.

use clap::Parser;
use std::path::PathBuf;
use tracewatch_core::config::{Config, FailurePolicy, ReportMode};

#[derive(Debug, Parser)]
#[command(
    name = "tracewatch",
    version,
    about = "Tail pub/sub trace logs and report network-wide delivery metrics"
)]
pub struct Cli {
    /// Directory of trace files to tail (overrides `ingest.traces_dir`).
    pub dir: Option<PathBuf>,

    /// Configuration file (TOML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seconds between reports.
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Seconds to wait before the first report.
    #[arg(long)]
    pub warmup: Option<u64>,

    /// Reporting sink: console, server or dashboard.
    #[arg(short, long)]
    pub mode: Option<ReportMode>,

    /// Address the snapshot server binds in server mode.
    #[arg(long)]
    pub listen: Option<String>,

    /// Start tailing files created after start-up.
    #[arg(long)]
    pub follow_new_files: bool,

    /// Stop all ingestion when any single file fails.
    #[arg(long)]
    pub abort_on_error: bool,

    /// Dashboard theme (default, gruvbox).
    #[arg(long)]
    pub theme: Option<String>,

    /// Write debug logs to /tmp/tracewatch-debug.log (tail -f to inspect).
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Apply every flag that was given on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.dir {
            config.ingest.traces_dir = dir.clone();
        }
        if let Some(secs) = self.interval {
            config.report.interval_secs = secs;
        }
        if let Some(secs) = self.warmup {
            config.report.warmup_secs = secs;
        }
        if let Some(mode) = self.mode {
            config.report.mode = mode;
        }
        if let Some(listen) = &self.listen {
            config.server.listen = listen.clone();
        }
        if self.follow_new_files {
            config.ingest.follow_new_files = true;
        }
        if self.abort_on_error {
            config.ingest.on_tailer_error = FailurePolicy::Abort;
        }
        if let Some(theme) = &self.theme {
            config.ui.theme = theme.clone();
        }
    }

    /// Load the layered configuration and apply the flags.
    pub fn resolve_config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }
}
