use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracewatch::cli::Cli;
use tracewatch_core::config::ReportMode;

const DEBUG_LOG: &str = "/tmp/tracewatch-debug.log";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    init_tracing(cli.debug, config.report.mode)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received; shutting down");
                on_signal.cancel();
            }
        });
        tracewatch::pipeline::run(config, cancel).await
    })
}

/// Console and server modes log to stderr so stdout stays with the report.
/// The dashboard owns the terminal, so it only logs to a file with `--debug`.
fn init_tracing(debug: bool, mode: ReportMode) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    if debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(DEBUG_LOG)?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("tracewatch debug log started — tail -f {DEBUG_LOG}");
        return Ok(());
    }

    if mode == ReportMode::Dashboard {
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    Ok(())
}
