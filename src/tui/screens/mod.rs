//! Screen rendering modules

pub mod analysis;
pub mod performance;
pub mod processes;

use crate::tui::{
    state::{AppState, Tab},
    theme::Styles,
    widgets::shortcuts::{get_shortcuts, render_shortcuts},
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

/// Main render function: header, the active tab, then the shortcuts bar
pub fn render(f: &mut Frame, app_state: &AppState) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Length(1), // Target line
            Constraint::Min(5),    // Body
            Constraint::Length(3), // Shortcuts
        ])
        .split(area);

    render_tabs(f, chunks[0], app_state);
    render_target_line(f, chunks[1], app_state);

    match app_state.tab {
        Tab::Performance => performance::render(f, chunks[2], app_state),
        Tab::Processes => processes::render(f, chunks[2], app_state),
        Tab::Analysis => analysis::render(f, chunks[2], app_state),
    }

    render_shortcuts(f, chunks[3], &get_shortcuts(app_state.tab));
}

fn render_tabs(f: &mut Frame, area: Rect, app_state: &AppState) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!("{} {}", i + 1, tab.title())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app_state.tab.index())
        .style(Styles::secondary())
        .highlight_style(Styles::selected())
        .divider(Span::styled("│", Styles::border()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::border())
                .title(Span::styled(" AI-Healthops ", Styles::title())),
        );

    f.render_widget(tabs, area);
}

fn render_target_line(f: &mut Frame, area: Rect, app_state: &AppState) {
    let mut spans = vec![
        Span::styled(" Target: ", Styles::secondary()),
        Span::styled(app_state.target_name.as_str(), Styles::emphasis()),
        Span::styled(format!(" (PID {})", app_state.pid), Styles::secondary()),
    ];

    if app_state.recorded > 0 || app_state.record_errors > 0 {
        spans.push(Span::styled("  ── recorded ", Styles::secondary()));
        spans.push(Span::styled(app_state.recorded.to_string(), Styles::primary()));
        if app_state.record_errors > 0 {
            spans.push(Span::styled(
                format!(" ({} failed)", app_state.record_errors),
                Styles::error(),
            ));
        }
    }

    if let Some(message) = &app_state.status_message {
        spans.push(Span::styled("  ── ", Styles::secondary()));
        spans.push(Span::styled(message.as_str(), Styles::warning()));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
