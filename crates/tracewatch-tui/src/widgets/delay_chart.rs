//! Sparkline of the average propagation delay across recent snapshots.

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Paragraph, Sparkline, Widget},
};
use std::collections::VecDeque;
use tracewatch_core::Snapshot;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Bounded ring of average-delay samples, stored in microseconds.
#[derive(Debug, Clone)]
pub struct DelayHistory {
    samples: VecDeque<u64>,
    capacity: usize,
}

impl DelayHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { samples: VecDeque::with_capacity(capacity), capacity }
    }

    /// Record one snapshot's average delay. Snapshots without any delay
    /// samples leave the history untouched.
    pub fn push(&mut self, average_delay_ns: Option<f64>) {
        let Some(ns) = average_delay_ns else { return };
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back((ns.max(0.0) / 1_000.0).round() as u64);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples oldest first, in microseconds.
    pub fn to_vec(&self) -> Vec<u64> {
        self.samples.iter().copied().collect()
    }

    pub fn peak(&self) -> Option<u64> {
        self.samples.iter().copied().max()
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

pub struct DelayChart<'a> {
    history: &'a DelayHistory,
    snapshot: Option<&'a Snapshot>,
    theme: &'a Theme,
}

impl<'a> DelayChart<'a> {
    pub fn new(history: &'a DelayHistory, snapshot: Option<&'a Snapshot>, theme: &'a Theme) -> Self {
        Self { history, snapshot, theme }
    }

    fn title(&self) -> Line<'static> {
        let current = match self.snapshot.and_then(Snapshot::average_delay_ms) {
            Some(ms) => format!("{ms:.3} ms"),
            None => "n/a".to_string(),
        };
        let peak = self
            .history
            .peak()
            .map(|us| format!("  peak {:.3} ms", us as f64 / 1_000.0))
            .unwrap_or_default();
        Line::from(vec![
            Span::styled(" Average delay ", self.theme.title),
            Span::styled(current, self.theme.value),
            Span::styled(format!("{peak} "), self.theme.muted),
        ])
    }
}

impl Widget for DelayChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(self.title())
            .border_style(self.theme.border_unfocused);

        if self.history.is_empty() {
            let inner = block.inner(area);
            block.render(area, buf);
            Paragraph::new(Span::styled("no delay samples yet", self.theme.muted))
                .render(inner, buf);
            return;
        }

        Sparkline::default()
            .block(block)
            .data(self.history.to_vec())
            .style(self.theme.chart_delay)
            .render(area, buf);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
