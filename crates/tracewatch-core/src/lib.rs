//! tracewatch-core — trace ingestion and aggregation engine.
//!
//! This crate holds everything that does not touch the filesystem or the
//! terminal: the trace record schema, the classifier, the shared aggregator,
//! configuration, and the periodic reporter.
//!
//! # Architecture
//!
//! ```text
//! Tailer ─┐
//! Tailer ─┼─► Classifier ─► Aggregator ─► Reporter ─► Sink
//! Tailer ─┘                  (Mutex)        (tick)
//! ```
//!
//! Tailers live in `tracewatch-feeds`; sinks live in the binary and in
//! `tracewatch-tui`.

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod report;
pub mod types;

pub use aggregator::{Aggregator, DelayRecord, Snapshot};
pub use error::DecodeError;
pub use types::{EventRecord, Fact, FactKind, Timestamp};
