//! Counters table — one row per aggregate the snapshot carries.

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Cell, Paragraph, Row, Table, Widget},
};
use tracewatch_core::Snapshot;

/// Label/value pairs shown in the panel, in display order.
pub fn rows(snapshot: &Snapshot) -> Vec<(&'static str, String)> {
    let delay = match snapshot.average_delay_ms() {
        Some(ms) => format!("{ms:.3} ms"),
        None => "n/a".to_string(),
    };
    vec![
        ("Peers", snapshot.peers.to_string()),
        ("Topics", snapshot.topics.to_string()),
        ("Published", snapshot.published_messages.to_string()),
        ("Delivered", snapshot.delivered_messages.to_string()),
        ("Duplicates", snapshot.duplicate_messages.to_string()),
        ("Sent RPCs", snapshot.sent_rpcs.to_string()),
        ("Average delay", delay),
        ("Delay samples", snapshot.delay_samples.to_string()),
    ]
}

pub struct StatsPanel<'a> {
    snapshot: Option<&'a Snapshot>,
    theme: &'a Theme,
}

impl<'a> StatsPanel<'a> {
    pub fn new(snapshot: Option<&'a Snapshot>, theme: &'a Theme) -> Self {
        Self { snapshot, theme }
    }
}

impl Widget for StatsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(Span::styled(" Aggregate ", self.theme.title))
            .border_style(self.theme.border_focused);

        let Some(snapshot) = self.snapshot else {
            let inner = block.inner(area);
            block.render(area, buf);
            Paragraph::new(Span::styled("waiting for first snapshot…", self.theme.muted))
                .render(inner, buf);
            return;
        };

        let table_rows = rows(snapshot).into_iter().map(|(label, value)| {
            Row::new(vec![
                Cell::from(Span::styled(label, self.theme.label)),
                Cell::from(Span::styled(value, self.theme.value)),
            ])
        });

        Table::new(table_rows, [Constraint::Length(16), Constraint::Fill(1)])
            .block(block)
            .render(area, buf);
    }
}
