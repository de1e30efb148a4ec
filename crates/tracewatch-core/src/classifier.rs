//! Classifier — decodes one raw trace line into zero or more [`Fact`]s.
//!
//! Decoding is schema-aware: every optional sub-structure defaults to absent,
//! so only a line that is not a JSON object with a `peerID` is rejected.
//! Facts come out in a fixed order: peer, topics (list order), published,
//! delivered, duplicate, rpc-sent. No deduplication happens here.

use crate::error::DecodeError;
use crate::types::{EventRecord, Fact, MessageRef, SubscriptionEntry};

/// Classify one raw line.
///
/// Whitespace-only input yields `Ok(vec![])` so blank separator lines are
/// not reported as malformed.
pub fn classify(line: &[u8]) -> Result<Vec<Fact>, DecodeError> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let record: EventRecord = serde_json::from_slice(line)?;
    facts_from_record(record)
}

/// Expand an already-decoded record into facts.
pub fn facts_from_record(record: EventRecord) -> Result<Vec<Fact>, DecodeError> {
    if record.peer_id.is_empty() {
        return Err(DecodeError::EmptyPeer);
    }

    let fallback = record.timestamp.map(|t| t.nanos());
    let mut facts = Vec::with_capacity(4);
    facts.push(Fact::PeerSeen(record.peer_id));

    let announced = record
        .seen_subscriptions
        .into_iter()
        .flatten()
        .chain(
            record
                .recv_rpc
                .and_then(|rpc| rpc.meta)
                .and_then(|meta| meta.subscription)
                .into_iter()
                .flatten(),
        );
    facts.extend(announced.filter_map(topic_fact));

    if let Some((message_id, timestamp)) = record.published.and_then(|m| message_parts(m, fallback)) {
        facts.push(Fact::Published { message_id, timestamp });
    }
    if let Some((message_id, timestamp)) = record.delivered.and_then(|m| message_parts(m, fallback)) {
        facts.push(Fact::Delivered { message_id, timestamp });
    }
    if record.duplicate.is_some_and(|m| m.is_set()) {
        facts.push(Fact::Duplicate);
    }
    if record.rpc_sent.is_some_and(|m| m.is_set()) {
        facts.push(Fact::RpcSent);
    }

    Ok(facts)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

// Topic counting ignores the subscribe/unsubscribe direction: an
// unsubscribe still proves the topic exists.
fn topic_fact(entry: SubscriptionEntry) -> Option<Fact> {
    entry
        .topic
        .filter(|t| !t.is_empty())
        .map(Fact::TopicSeen)
}

// A message object without an id carries no fact.
fn message_parts(msg: MessageRef, fallback: Option<i64>) -> Option<(String, Option<i64>)> {
    let id = msg.message_id.filter(|id| !id.is_empty())?;
    let ts = msg.timestamp.map(|t| t.nanos()).or(fallback);
    Some((id, ts))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
