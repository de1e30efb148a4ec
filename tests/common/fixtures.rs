//! Canned trace corpora and on-disk trace directories.

use super::builders::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Corpora
// ---------------------------------------------------------------------------

/// The three-line walkthrough: one publish, one delivery 500 ns later, one
/// duplicate. Yields 2 peers, 1/1/1 counts and an average delay of 500.
pub fn walkthrough() -> Vec<String> {
    vec![
        r#"{"peerID":"A","published":{"messageID":"m1","timestamp":1000}}"#.to_string(),
        r#"{"peerID":"B","delivered":{"messageID":"m1","timestamp":1500}}"#.to_string(),
        r#"{"peerID":"B","duplicate":true}"#.to_string(),
    ]
}

/// A publisher trace for `peer`: `count` messages `m{offset}..`, published
/// 1 ms apart starting at `base`.
pub fn publisher(peer: &str, offset: usize, count: usize, base: i64) -> Vec<String> {
    (0..count)
        .map(|i| {
            let id = format!("m{}", offset + i);
            TraceLine::peer(peer).published(&id, base + i as i64 * 1_000_000).topic("blocks").build()
        })
        .collect()
}

/// A subscriber trace for `peer` that receives every message of
/// [`publisher`] `delay` ns after it was published.
pub fn subscriber(peer: &str, offset: usize, count: usize, base: i64, delay: i64) -> Vec<String> {
    (0..count)
        .map(|i| {
            let id = format!("m{}", offset + i);
            deliver(peer, &id, base + i as i64 * 1_000_000 + delay)
        })
        .collect()
}

/// Mixed bag of everything the classifier ignores or rejects.
pub fn noise() -> Vec<String> {
    vec![
        "not json at all".to_string(),
        r#"{"published":{"messageID":"orphan","timestamp":1}}"#.to_string(),
        r#"{"peerID":""}"#.to_string(),
        "[1,2,3]".to_string(),
        r#"{"peerID":"A","publ"#.to_string(),
    ]
}

// ---------------------------------------------------------------------------
// Trace directories
// ---------------------------------------------------------------------------

/// A temporary traces directory. Dropped with the test.
pub struct TraceDir {
    dir: TempDir,
}

impl TraceDir {
    pub fn new() -> Self {
        Self { dir: tempfile::tempdir().expect("create temp trace dir") }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `lines` as a newline-terminated file called `name`.
    pub fn write<S: AsRef<str>>(&self, name: &str, lines: &[S]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, file_body(lines)).expect("write trace file");
        path
    }

    /// Append raw bytes to `name`, creating it when missing.
    pub fn append(&self, name: &str, bytes: &str) {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.path().join(name))
            .expect("open trace file for append");
        file.write_all(bytes.as_bytes()).expect("append to trace file");
    }
}
