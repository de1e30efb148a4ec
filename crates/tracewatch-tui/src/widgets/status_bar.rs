//! Status bar widget — the 1-line strip at the top of the screen.

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};
use tracewatch_core::Snapshot;

/// Title, a LIVE/PAUSED badge and the time of the shown snapshot.
///
/// Keybinding hints (`q:quit  p:pause  ?:help`) are right-aligned in the
/// same row.
pub struct StatusBar<'a> {
    snapshot: Option<&'a Snapshot>,
    paused: bool,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(snapshot: Option<&'a Snapshot>, paused: bool, theme: &'a Theme) -> Self {
        Self { snapshot, paused, theme }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let badge = if self.paused {
            Span::styled(" PAUSED ", self.theme.status_paused)
        } else {
            Span::styled(" LIVE ", self.theme.status_live)
        };
        let taken = self
            .snapshot
            .map(|s| format!(" snapshot {}", s.taken_at.format("%H:%M:%S")))
            .unwrap_or_default();

        let line = Line::from(vec![
            Span::styled(" tracewatch ", self.theme.title),
            badge,
            Span::styled(taken, self.theme.muted),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);

        let hint = " q:quit  p:pause  ?:help ";
        let hint_x = area.right().saturating_sub(hint.len() as u16);
        buf.set_string(hint_x, area.y, hint, Style::default().add_modifier(Modifier::DIM));
    }
}
