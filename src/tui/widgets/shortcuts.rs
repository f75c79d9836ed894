//! Shortcuts bar widget

use crate::tui::state::Tab;
use crate::tui::theme::Styles;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render shortcuts bar at the bottom of the screen
pub fn render_shortcuts(f: &mut Frame, area: Rect, shortcuts: &[(&str, &str)]) {
    if shortcuts.is_empty() {
        return;
    }

    let available_width = area.width.saturating_sub(2);

    let mut spans: Vec<Span> = vec![];
    let mut current_width = 0;

    for (i, (key, desc)) in shortcuts.iter().enumerate() {
        let separator = if i > 0 { " • " } else { "" };
        let key_text = format!("[{}]", key);
        let desc_text = format!(" {}", desc);
        let item_width = (separator.chars().count() + key_text.chars().count() + desc_text.chars().count()) as u16;

        if i > 0 && current_width + item_width > available_width {
            spans.push(Span::styled(" ...", Styles::secondary()));
            break;
        }

        if i > 0 {
            spans.push(Span::styled(separator, Styles::secondary()));
        }
        spans.push(Span::styled(key_text, Styles::emphasis()));
        spans.push(Span::styled(desc_text, Styles::secondary()));

        current_width += item_width;
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Styles::border())
                .padding(ratatui::widgets::Padding::new(0, 1, 0, 1)),
        )
        .style(Styles::secondary());

    f.render_widget(paragraph, area);
}

/// Get shortcuts for a tab
pub fn get_shortcuts(tab: Tab) -> Vec<(&'static str, &'static str)> {
    match tab {
        Tab::Performance => vec![
            ("Tab", "Switch Tab"),
            ("↑↓", "Scroll Events"),
            ("1-3", "Jump to Tab"),
            ("Q", "Quit"),
        ],
        Tab::Processes => vec![
            ("Tab", "Switch Tab"),
            ("↑↓", "Navigate"),
            ("R", "Refresh"),
            ("Q", "Quit"),
        ],
        Tab::Analysis => vec![
            ("Tab", "Switch Tab"),
            ("↑↓", "Scroll"),
            ("PgUp/PgDn", "Page"),
            ("Q", "Quit"),
        ],
    }
}
