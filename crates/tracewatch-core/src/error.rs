//! Errors raised while turning a raw trace line into facts.

/// A line that could not be decoded into an [`EventRecord`](crate::EventRecord).
///
/// The line is dropped; ingestion continues with the next one.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("line is not a valid trace record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("trace record has an empty peerID")]
    EmptyPeer,
}
