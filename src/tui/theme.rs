//! TUI styles

use ratatui::style::{Color, Modifier, Style};

pub struct Styles;

impl Styles {
    pub fn title() -> Style {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    }

    pub fn header() -> Style {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border() -> Style {
        Style::default().fg(Color::DarkGray)
    }

    pub fn emphasis() -> Style {
        Style::default().fg(Color::Cyan)
    }

    pub fn primary() -> Style {
        Style::default().fg(Color::White)
    }

    pub fn secondary() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn selected() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }

    pub fn success() -> Style {
        Style::default().fg(Color::Green)
    }

    pub fn warning() -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn error() -> Style {
        Style::default().fg(Color::Red)
    }

    pub fn chart_line() -> Style {
        Style::default().fg(Color::Cyan)
    }
}

/// Colour for a total CPU figure: red above 20%, yellow above 10%.
pub fn cpu_style(total_percent: f64) -> Style {
    if total_percent > 20.0 {
        Styles::error()
    } else if total_percent > 10.0 {
        Styles::warning()
    } else {
        Styles::success()
    }
}

/// Colour for a process-list CPU figure: red above 5%, yellow above 2%.
pub fn process_cpu_style(cpu_usage: f32) -> Style {
    if cpu_usage > 5.0 {
        Styles::error()
    } else if cpu_usage > 2.0 {
        Styles::warning()
    } else {
        Styles::success()
    }
}
