//! tracewatch-feeds — trace file tailing and ingestion supervision.
//!
//! Each [`Tailer`] follows one file and applies the facts of every complete
//! line to the shared [`tracewatch_core::Aggregator`]. The [`Ingestor`] owns
//! the set of tailers for a traces directory and applies the configured
//! failure policy.

pub mod error;
pub mod ingest;
pub mod tailer;

pub use error::{IngestError, TailError};
pub use ingest::{discover, IngestReport, Ingestor};
pub use tailer::{TailSummary, Tailer};
