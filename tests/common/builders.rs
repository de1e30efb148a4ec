//! Test builders — ergonomic constructors for trace lines.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// TraceLine
// ---------------------------------------------------------------------------

/// Which key names the built line uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `published`, `delivered`, `duplicate`, `rpcSent`.
    Flat,
    /// `publishMessage`, `deliverMessage`, `duplicateMessage`, `sendRPC`.
    Tracer,
}

/// Fluent builder for one JSON trace line.
///
/// # Example
///
/// ```rust
/// let line = TraceLine::peer("A")
///     .published("m1", 1_000)
///     .topic("blocks")
///     .build();
/// ```
pub struct TraceLine {
    dialect: Dialect,
    fields: Map<String, Value>,
    topics: Vec<Value>,
}

impl TraceLine {
    pub fn peer(peer: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("peerID".into(), Value::String(peer.into()));
        Self { dialect: Dialect::Flat, fields, topics: Vec::new() }
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    fn key(&self, flat: &'static str, tracer: &'static str) -> String {
        match self.dialect {
            Dialect::Flat => flat.to_string(),
            Dialect::Tracer => tracer.to_string(),
        }
    }

    /// Record-level timestamp.
    pub fn at(mut self, ts: i64) -> Self {
        self.fields.insert("timestamp".into(), json!(ts));
        self
    }

    pub fn published(mut self, id: &str, ts: i64) -> Self {
        let key = self.key("published", "publishMessage");
        self.fields.insert(key, json!({ "messageID": id, "timestamp": ts }));
        self
    }

    /// Publish sub-object without its own timestamp.
    pub fn published_untimed(mut self, id: &str) -> Self {
        let key = self.key("published", "publishMessage");
        self.fields.insert(key, json!({ "messageID": id }));
        self
    }

    pub fn delivered(mut self, id: &str, ts: i64) -> Self {
        let key = self.key("delivered", "deliverMessage");
        self.fields.insert(key, json!({ "messageID": id, "timestamp": ts }));
        self
    }

    pub fn delivered_untimed(mut self, id: &str) -> Self {
        let key = self.key("delivered", "deliverMessage");
        self.fields.insert(key, json!({ "messageID": id }));
        self
    }

    pub fn duplicate(mut self) -> Self {
        let (key, value) = match self.dialect {
            Dialect::Flat => ("duplicate", json!(true)),
            Dialect::Tracer => ("duplicateMessage", json!({ "messageID": "dup" })),
        };
        self.fields.insert(key.into(), value);
        self
    }

    pub fn rpc_sent(mut self) -> Self {
        let (key, value) = match self.dialect {
            Dialect::Flat => ("rpcSent", json!(true)),
            Dialect::Tracer => ("sendRPC", json!({ "sendTo": "peer" })),
        };
        self.fields.insert(key.into(), value);
        self
    }

    /// Subscription announcement for `topic`.
    pub fn topic(mut self, topic: &str) -> Self {
        self.topics.push(json!({ "peerID": "announcer", "topic": topic, "subscribe": true }));
        self
    }

    pub fn build(mut self) -> String {
        if !self.topics.is_empty() {
            let topics = Value::Array(std::mem::take(&mut self.topics));
            match self.dialect {
                Dialect::Flat => {
                    self.fields.insert("seenSubscriptions".into(), topics);
                }
                Dialect::Tracer => {
                    self.fields.insert(
                        "recvRPC".into(),
                        json!({ "receivedFrom": "announcer", "meta": { "subscription": topics } }),
                    );
                }
            }
        }
        Value::Object(self.fields).to_string()
    }
}

// ---------------------------------------------------------------------------
// Shorthands
// ---------------------------------------------------------------------------

pub fn publish(peer: &str, id: &str, ts: i64) -> String {
    TraceLine::peer(peer).published(id, ts).build()
}

pub fn deliver(peer: &str, id: &str, ts: i64) -> String {
    TraceLine::peer(peer).delivered(id, ts).build()
}

pub fn duplicate(peer: &str) -> String {
    TraceLine::peer(peer).duplicate().build()
}

/// Join lines into newline-terminated file contents.
pub fn file_body<S: AsRef<str>>(lines: &[S]) -> String {
    let mut body = String::new();
    for line in lines {
        body.push_str(line.as_ref());
        body.push('\n');
    }
    body
}
