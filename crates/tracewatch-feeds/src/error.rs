use std::path::PathBuf;

/// A tailer stopped because its file could not be opened or read.
#[derive(Debug, thiserror::Error)]
#[error("tailing {path} failed: {source}")]
pub struct TailError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Ingestion as a whole could not start or was aborted.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("cannot list traces directory {path}: {source}")]
    Discover {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot watch traces directory: {0}")]
    Watch(#[from] notify::Error),
    #[error("ingestion aborted: {0}")]
    Aborted(#[from] TailError),
}
