//! Performance tab: CPU chart, latest sample and recent history

use crate::tui::{
    state::AppState,
    theme::{cpu_style, Styles},
    widgets::table::render_events_table,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, app_state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(5),
            Constraint::Min(5),
        ])
        .split(area);

    render_chart(f, chunks[0], app_state);
    render_latest(f, chunks[1], app_state);
    render_events_table(f, chunks[2], &app_state.events, app_state.scroll);
}

fn render_chart(f: &mut Frame, area: Rect, app_state: &AppState) {
    let series = &app_state.series;
    let points = series.points();
    let x_max = series.capacity().saturating_sub(1).max(1) as f64;
    let y_max = series.max_value().max(100.0);

    let dataset = Dataset::default()
        .name("Total CPU %")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Styles::chart_line())
        .data(&points);

    let title = match series.latest() {
        Some(value) => format!("CPU Usage ({:.0}%)", value),
        None => "CPU Usage".to_string(),
    };

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::border())
                .title(Span::styled(title, Styles::title())),
        )
        .x_axis(
            Axis::default()
                .style(Styles::border())
                .bounds([0.0, x_max]),
        )
        .y_axis(
            Axis::default()
                .style(Styles::border())
                .bounds([0.0, y_max])
                .labels(vec![
                    Span::styled("0", Styles::secondary()),
                    Span::styled(format!("{:.0}", y_max / 2.0), Styles::secondary()),
                    Span::styled(format!("{:.0}", y_max), Styles::secondary()),
                ]),
        );

    f.render_widget(chart, area);
}

fn render_latest(f: &mut Frame, area: Rect, app_state: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Styles::border())
        .title(Span::styled("Latest Sample", Styles::title()));

    let Some(sample) = app_state.latest else {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "Waiting for the first sample...",
            Styles::secondary(),
        )))
        .block(block);
        f.render_widget(waiting, area);
        return;
    };

    let m = &sample.metrics;
    let total = m.cpu_total_percent();
    let mut cpu_line = vec![
        Span::styled("CPU ", Styles::secondary()),
        Span::styled(format!("{}%", total), cpu_style(total as f64)),
        Span::styled(
            format!("  (user {}%, kernel {}%)", m.cpu_user_percent, m.cpu_kernel_percent),
            Styles::secondary(),
        ),
    ];
    if !m.status.is_complete() {
        let mut failed = Vec::new();
        if !m.status.cpu {
            failed.push("cpu");
        }
        if !m.status.io {
            failed.push("io");
        }
        if !m.status.memory {
            failed.push("memory");
        }
        cpu_line.push(Span::styled(
            format!("  unavailable: {}", failed.join(", ")),
            Styles::warning(),
        ));
    }

    let io_line = Line::from(vec![
        Span::styled("I/O ", Styles::secondary()),
        Span::styled(
            format!(
                "read {}/s ({} ops)  write {}/s ({} ops)",
                bytesize::to_string(m.io_read_bytes_per_sec, false),
                m.io_read_ops_delta,
                bytesize::to_string(m.io_write_bytes_per_sec, false),
                m.io_write_ops_delta,
            ),
            Styles::primary(),
        ),
    ]);

    let memory_line = Line::from(vec![
        Span::styled("Memory ", Styles::secondary()),
        Span::styled(
            format!(
                "working set {} (peak {})  pagefile {}  faults {}",
                bytesize::to_string(m.memory.working_set_size, false),
                bytesize::to_string(m.memory.peak_working_set_size, false),
                bytesize::to_string(m.memory.pagefile_usage, false),
                m.memory.page_fault_count,
            ),
            Styles::primary(),
        ),
    ]);

    let paragraph = Paragraph::new(vec![Line::from(cpu_line), io_line, memory_line]).block(block);
    f.render_widget(paragraph, area);
}
