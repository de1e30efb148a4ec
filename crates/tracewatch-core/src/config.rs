//! Configuration types for tracewatch.
//!
//! [`Config::load`] layers the embedded defaults, an optional TOML file and
//! `TRACEWATCH_<SECTION>__<KEY>` environment variables. [`Config::defaults`]
//! returns the built-in defaults without touching the filesystem or the
//! environment (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[ingest]
traces_dir       = "./traces"
poll_interval_ms = 1000
follow_new_files = false
on_tailer_error  = "isolate"

[report]
interval_secs = 5
warmup_secs   = 5
mode          = "console"

[server]
listen = "0.0.0.0:3000"

[ui]
theme       = "default"
history_len = 120
"#;

const ENV_PREFIX: &str = "TRACEWATCH";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// `[ingest]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Directory whose files are tailed. Listed once at start-up.
    #[serde(default = "default_traces_dir")]
    pub traces_dir: PathBuf,
    /// How long a tailer sleeps after catching up with its file.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Start tailers for files created after start-up.
    #[serde(default)]
    pub follow_new_files: bool,
    #[serde(default)]
    pub on_tailer_error: FailurePolicy,
}

fn default_traces_dir() -> PathBuf { PathBuf::from("./traces") }
fn default_poll_interval_ms() -> u64 { 1000 }

impl IngestConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            traces_dir: default_traces_dir(),
            poll_interval_ms: default_poll_interval_ms(),
            follow_new_files: false,
            on_tailer_error: FailurePolicy::default(),
        }
    }
}

/// What the ingestion supervisor does when one tailer fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and keep every other tailer running.
    #[default]
    Isolate,
    /// Cancel all tailers and return the error.
    Abort,
}

/// `[report]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Delay before the first report, giving tailers time to backfill.
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,
    #[serde(default)]
    pub mode: ReportMode,
}

fn default_interval_secs() -> u64 { 5 }
fn default_warmup_secs() -> u64 { 5 }

impl ReportConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_secs)
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            warmup_secs: default_warmup_secs(),
            mode: ReportMode::default(),
        }
    }
}

/// Which reporting sink consumes snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    #[default]
    Console,
    Server,
    Dashboard,
}

impl std::str::FromStr for ReportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "console" => Ok(ReportMode::Console),
            "server" => Ok(ReportMode::Server),
            "dashboard" | "tui" => Ok(ReportMode::Dashboard),
            other => Err(format!("unknown report mode: {other}")),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String { "0.0.0.0:3000".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

/// `[ui]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Number of average-delay samples kept for the dashboard sparkline.
    #[serde(default = "default_history_len")]
    pub history_len: usize,
}

fn default_theme() -> String { "default".to_string() }
fn default_history_len() -> usize { 120 }

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            history_len: default_history_len(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load configuration.
    ///
    /// `path` is required to exist when given; otherwise the per-user file
    /// (`$XDG_CONFIG_HOME/tracewatch/config.toml`) is read if present.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::from(user_config_path().as_path()).required(false),
        };

        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn user_config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("tracewatch")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
