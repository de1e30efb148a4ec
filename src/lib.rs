//! tracewatch — tail pub/sub trace logs and report network-wide delivery
//! metrics.
//!
//! The engine lives in the workspace crates; this crate holds the process
//! surface: CLI flags, the HTTP/websocket sink and the task wiring.
//!
//! # Architecture
//!
//! ```text
//! traces/*.json ─► Ingestor ─► Tailer × N ─► Aggregator ─┬─► Reporter ─► console
//!                                                        ├─► Reporter ─► websocket
//!                                                        └─► dashboard (pull)
//! ```

pub mod cli;
pub mod pipeline;
pub mod server;
