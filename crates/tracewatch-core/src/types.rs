//! Core types for tracewatch-core.
//!
//! This module defines the on-disk shape of a trace line ([`EventRecord`])
//! and the semantic [`Fact`]s the classifier extracts from it. Every
//! sub-structure is optional: a missing key means "no such fact", never an
//! error.

use serde::Deserialize;

/// Event time in nanoseconds since an arbitrary epoch.
pub type Timestamp = i64;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One decoded trace line.
///
/// Two dialects are accepted: the flat form (`published`, `delivered`,
/// `duplicate`, `rpcSent`, `seenSubscriptions`) and the pub/sub tracer form
/// (`publishMessage`, `deliverMessage`, `duplicateMessage`, `sendRPC`,
/// `recvRPC.meta.subscription`). Unknown keys are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Emitting node. Required; records without it fail to decode.
    #[serde(rename = "peerID")]
    pub peer_id: String,
    /// Record-level event time, used when a fact carries no time of its own.
    pub timestamp: Option<WireTimestamp>,
    pub seen_subscriptions: Option<Vec<SubscriptionEntry>>,
    #[serde(alias = "publishMessage")]
    pub published: Option<MessageRef>,
    #[serde(alias = "deliverMessage")]
    pub delivered: Option<MessageRef>,
    #[serde(alias = "duplicateMessage")]
    pub duplicate: Option<Marker>,
    #[serde(alias = "sendRPC")]
    pub rpc_sent: Option<Marker>,
    #[serde(rename = "recvRPC")]
    pub recv_rpc: Option<RecvRpc>,
}

/// A subscription announcement seen by the emitting node.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionEntry {
    #[serde(rename = "peerID")]
    pub peer_id: Option<String>,
    pub topic: Option<String>,
    #[serde(alias = "subscribe")]
    pub subscribed: Option<bool>,
}

/// Reference to a message inside a publish or deliver sub-object.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    #[serde(rename = "messageID")]
    pub message_id: Option<String>,
    pub timestamp: Option<WireTimestamp>,
}

/// `recvRPC` summary; only the subscription list is of interest.
#[derive(Debug, Clone, Deserialize)]
pub struct RecvRpc {
    pub meta: Option<RpcMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcMeta {
    pub subscription: Option<Vec<SubscriptionEntry>>,
}

/// Timestamps arrive as JSON integers from most writers but as floats from
/// some; floats are rounded to the nearest nanosecond.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireTimestamp {
    Int(i64),
    Float(f64),
}

impl WireTimestamp {
    pub fn nanos(self) -> Timestamp {
        match self {
            WireTimestamp::Int(n) => n,
            WireTimestamp::Float(f) => f.round() as i64,
        }
    }
}

/// Presence marker for `duplicate` / `rpcSent`.
///
/// The flat dialect writes `true`; the tracer dialect writes a detail object.
/// Anything other than an explicit `false` (or `null`, which decodes to
/// `None`) counts as present.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Marker {
    Flag(bool),
    Detail(serde_json::Value),
}

impl Marker {
    pub fn is_set(&self) -> bool {
        !matches!(self, Marker::Flag(false))
    }
}

// ---------------------------------------------------------------------------
// Facts
// ---------------------------------------------------------------------------

/// One semantic unit extracted from an [`EventRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fact {
    PeerSeen(String),
    TopicSeen(String),
    Published {
        message_id: String,
        timestamp: Option<Timestamp>,
    },
    Delivered {
        message_id: String,
        timestamp: Option<Timestamp>,
    },
    Duplicate,
    RpcSent,
}

impl Fact {
    /// Short name used in logs and benchmark labels.
    pub fn kind(&self) -> FactKind {
        match self {
            Fact::PeerSeen(_) => FactKind::PeerSeen,
            Fact::TopicSeen(_) => FactKind::TopicSeen,
            Fact::Published { .. } => FactKind::Published,
            Fact::Delivered { .. } => FactKind::Delivered,
            Fact::Duplicate => FactKind::Duplicate,
            Fact::RpcSent => FactKind::RpcSent,
        }
    }
}

/// Discriminant of a [`Fact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactKind {
    PeerSeen,
    TopicSeen,
    Published,
    Delivered,
    Duplicate,
    RpcSent,
}

impl std::fmt::Display for FactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactKind::PeerSeen => write!(f, "peer-seen"),
            FactKind::TopicSeen => write!(f, "topic-seen"),
            FactKind::Published => write!(f, "published"),
            FactKind::Delivered => write!(f, "delivered"),
            FactKind::Duplicate => write!(f, "duplicate"),
            FactKind::RpcSent => write!(f, "rpc-sent"),
        }
    }
}
