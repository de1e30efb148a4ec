//! Domain-specific assertion macros for tracewatch harnesses.
//!
//! These wrap `pretty_assertions` and add context-rich failure messages that
//! make it clear *which* aggregate diverged.

// ---------------------------------------------------------------------------
// Snapshot assertions
// ---------------------------------------------------------------------------

/// Assert the counters of a snapshot, naming each one that differs.
///
/// ```rust
/// assert_counts!(snap, peers: 2, published: 1, delivered: 1, duplicates: 1);
/// ```
#[macro_export]
macro_rules! assert_counts {
    ($snap:expr, $($field:ident : $value:expr),+ $(,)?) => {{
        let snap: &tracewatch_core::Snapshot = &$snap;
        $(
            let actual = $crate::common::count_of(snap, stringify!($field));
            pretty_assertions::assert_eq!(
                actual,
                ($value) as u64,
                "assert_counts! failed on `{}`\n  snapshot: {:?}",
                stringify!($field),
                snap
            );
        )+
    }};
}

/// Look up a counter by the short name used in [`assert_counts!`].
pub fn count_of(snap: &tracewatch_core::Snapshot, field: &str) -> u64 {
    match field {
        "peers" => snap.peers as u64,
        "topics" => snap.topics as u64,
        "published" => snap.published_messages,
        "delivered" => snap.delivered_messages,
        "duplicates" => snap.duplicate_messages,
        "rpcs" => snap.sent_rpcs,
        "samples" => snap.delay_samples,
        "tracked" => snap.tracked_messages as u64,
        other => panic!("assert_counts!: unknown counter {other:?}"),
    }
}

/// Assert the average delay in nanoseconds to within a small epsilon.
#[macro_export]
macro_rules! assert_avg_delay {
    ($snap:expr, None) => {{
        let snap: &tracewatch_core::Snapshot = &$snap;
        assert!(
            snap.average_delay_ns.is_none(),
            "assert_avg_delay! expected no average, got {:?}",
            snap.average_delay_ns
        );
    }};
    ($snap:expr, $expected:expr) => {{
        let snap: &tracewatch_core::Snapshot = &$snap;
        let expected: f64 = ($expected) as f64;
        match snap.average_delay_ns {
            Some(actual) if (actual - expected).abs() < 1e-6 => {}
            other => panic!(
                "assert_avg_delay! failed:\n  expected: {}\n  actual:   {:?}",
                expected, other
            ),
        }
    }};
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

/// Poll `check` every 10 ms until it returns true or `timeout` elapses.
///
/// Uses real time; harnesses that pause the clock must not call it.
pub async fn eventually(timeout: std::time::Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
