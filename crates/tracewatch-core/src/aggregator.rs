//! Aggregator — the single shared, mutable view of network-wide statistics.
//!
//! All tailers apply facts to one [`Aggregator`] through an `Arc`; reporting
//! sinks read [`Snapshot`]s from it. One mutex guards the whole state and is
//! held for O(1) work per fact or snapshot, never across I/O.
//!
//! # Average delay
//!
//! The mean delivery delay is maintained incrementally. A delay sample
//! (`delivery - publish`) enters the running totals exactly once:
//!
//! - when a delivery is applied to a message whose publish time is known, or
//! - when a publish time is first set on a message that already holds
//!   deliveries (deliveries may arrive before their publish).
//!
//! Overwriting a publish time retracts the message's old contribution and
//! re-adds it against the new time. Each [`DelayRecord`] keeps the sum of its
//! delivery times, so both steps are O(1) and the running mean always equals
//! [`Aggregator::recompute_average_delay`]. Messages that were never
//! published contribute no samples.

use crate::classifier;
use crate::error::DecodeError;
use crate::types::{Fact, Timestamp};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

// ---------------------------------------------------------------------------
// DelayRecord
// ---------------------------------------------------------------------------

/// Publish and delivery times observed for one message id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelayRecord {
    pub publish_timestamp: Option<Timestamp>,
    pub delivery_timestamps: Vec<Timestamp>,
    delivery_sum: i128,
}

impl DelayRecord {
    /// Delay samples for this message; empty until a publish time is known.
    pub fn samples(&self) -> impl Iterator<Item = i128> + '_ {
        let publish = self.publish_timestamp;
        self.delivery_timestamps
            .iter()
            .filter_map(move |&d| publish.map(|p| d as i128 - p as i128))
    }

    /// Sum of all samples, or `None` if the message was never published.
    fn delay_sum(&self) -> Option<i128> {
        self.publish_timestamp
            .map(|p| self.delivery_sum - self.delivery_timestamps.len() as i128 * p as i128)
    }

    fn sample_count(&self) -> u64 {
        if self.publish_timestamp.is_some() {
            self.delivery_timestamps.len() as u64
        } else {
            0
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct AggregateState {
    seen_peers: HashSet<String>,
    seen_topics: HashSet<String>,
    published: u64,
    delivered: u64,
    duplicates: u64,
    rpc_sent: u64,
    delays: HashMap<String, DelayRecord>,
    delay_sum: i128,
    delay_samples: u64,
}

impl AggregateState {
    fn apply(&mut self, fact: &Fact) {
        match fact {
            Fact::PeerSeen(peer) => {
                if !self.seen_peers.contains(peer) {
                    self.seen_peers.insert(peer.clone());
                }
            }
            Fact::TopicSeen(topic) => {
                if !self.seen_topics.contains(topic) {
                    self.seen_topics.insert(topic.clone());
                }
            }
            Fact::Published { message_id, timestamp } => {
                self.published += 1;
                let record = self.delays.entry(message_id.clone()).or_default();
                if let Some(ts) = *timestamp {
                    if let Some(old) = record.delay_sum() {
                        self.delay_sum -= old;
                        self.delay_samples -= record.sample_count();
                    }
                    record.publish_timestamp = Some(ts);
                    if let Some(new) = record.delay_sum() {
                        self.delay_sum += new;
                        self.delay_samples += record.sample_count();
                    }
                }
            }
            Fact::Delivered { message_id, timestamp } => {
                self.delivered += 1;
                let record = self.delays.entry(message_id.clone()).or_default();
                if let Some(ts) = *timestamp {
                    record.delivery_timestamps.push(ts);
                    record.delivery_sum += ts as i128;
                    if let Some(p) = record.publish_timestamp {
                        self.delay_sum += ts as i128 - p as i128;
                        self.delay_samples += 1;
                    }
                }
            }
            Fact::Duplicate => self.duplicates += 1,
            Fact::RpcSent => self.rpc_sent += 1,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            peers: self.seen_peers.len(),
            topics: self.seen_topics.len(),
            published_messages: self.published,
            delivered_messages: self.delivered,
            duplicate_messages: self.duplicates,
            sent_rpcs: self.rpc_sent,
            average_delay_ns: mean(self.delay_sum, self.delay_samples),
            delay_samples: self.delay_samples,
            tracked_messages: self.delays.len(),
            taken_at: Utc::now(),
        }
    }
}

fn mean(sum: i128, count: u64) -> Option<f64> {
    (count > 0).then(|| sum as f64 / count as f64)
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Point-in-time copy of the aggregate, as handed to reporting sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub peers: usize,
    pub topics: usize,
    pub published_messages: u64,
    pub delivered_messages: u64,
    pub duplicate_messages: u64,
    pub sent_rpcs: u64,
    /// Mean of `delivery - publish` in timestamp units (nanoseconds);
    /// `None` until at least one sample exists.
    pub average_delay_ns: Option<f64>,
    pub delay_samples: u64,
    pub tracked_messages: usize,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    /// Average delay converted to milliseconds.
    pub fn average_delay_ms(&self) -> Option<f64> {
        self.average_delay_ns.map(|ns| ns / 1_000_000.0)
    }

    /// True when every counter matches `other`, ignoring `taken_at`.
    pub fn same_counts(&self, other: &Snapshot) -> bool {
        Snapshot { taken_at: other.taken_at, ..self.clone() } == *other
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Owned, lock-guarded aggregate state. Share it with `Arc<Aggregator>`.
#[derive(Debug, Default)]
pub struct Aggregator {
    state: Mutex<AggregateState>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    // `AggregateState::apply` never panics mid-update, so a poisoned lock
    // still guards consistent state.
    fn lock(&self) -> MutexGuard<'_, AggregateState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply one fact as a single atomic unit.
    pub fn apply(&self, fact: &Fact) {
        self.lock().apply(fact);
    }

    /// Apply a batch of facts, each under its own lock acquisition.
    pub fn apply_all<'a>(&self, facts: impl IntoIterator<Item = &'a Fact>) {
        for fact in facts {
            self.apply(fact);
        }
    }

    /// Classify `line` outside the lock, then apply every fact it yields.
    ///
    /// Returns the number of facts applied. A malformed line changes nothing.
    pub fn ingest_line(&self, line: &[u8]) -> Result<usize, DecodeError> {
        let facts = classifier::classify(line)?;
        self.apply_all(&facts);
        Ok(facts.len())
    }

    /// Consistent copy of every public counter.
    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    /// Copy of the delay record for one message id.
    pub fn delay_record(&self, message_id: &str) -> Option<DelayRecord> {
        self.lock().delays.get(message_id).cloned()
    }

    /// Mean delay computed from scratch over every record.
    ///
    /// The map is copied under the lock and scanned after it is released, so
    /// fact application is only held up for the copy.
    pub fn recompute_average_delay(&self) -> Option<f64> {
        let delays = self.lock().delays.clone();
        let (sum, count) = delays
            .values()
            .flat_map(DelayRecord::samples)
            .fold((0i128, 0u64), |(sum, n), d| (sum + d, n + 1));
        mean(sum, count)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
