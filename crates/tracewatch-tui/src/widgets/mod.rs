//! Ratatui widgets for the tracewatch dashboard.

pub mod command_bar;
pub mod delay_chart;
pub mod help;
pub mod stats_panel;
pub mod status_bar;
