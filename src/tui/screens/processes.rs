//! Processes tab

use crate::tui::{state::AppState, theme::Styles, widgets::table::render_process_table};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, app_state: &AppState) {
    if app_state.processes.is_empty() {
        let message = if app_state.processes_refreshed.is_some() {
            "No processes reported."
        } else {
            "Loading process list..."
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(message, Styles::secondary()))).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::border())
                .title(Span::styled("Processes", Styles::title())),
        );
        f.render_widget(paragraph, area);
        return;
    }

    render_process_table(f, area, &app_state.processes, app_state.scroll, app_state.pid);
}
