//! Table widgets for the sample history and the process list

use crate::monitor::Sample;
use crate::processes::ProcessEntry;
use crate::tui::theme::{cpu_style, process_cpu_style, Styles};
use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};
use std::collections::VecDeque;
use unicode_width::UnicodeWidthChar;

/// Truncate `text` to at most `max_width` terminal columns, ending in "…" when cut.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn rate(bytes_per_sec: u64) -> String {
    format!("{}/s", bytesize::to_string(bytes_per_sec, false))
}

/// Render the recent samples, newest at the top
pub fn render_events_table(f: &mut Frame, area: Rect, events: &VecDeque<Sample>, scroll_offset: usize) {
    let visible_rows = (area.height as usize).saturating_sub(3);
    let start_idx = scroll_offset.min(events.len());

    let header = Row::new(vec![
        Cell::from("#"),
        Cell::from("TIME"),
        Cell::from("PID"),
        Cell::from("USER %"),
        Cell::from("KERNEL %"),
        Cell::from("TOTAL %"),
        Cell::from("READ"),
        Cell::from("WRITE"),
        Cell::from("WORKING SET"),
    ])
    .style(Styles::header());

    let rows: Vec<Row> = events
        .iter()
        .skip(start_idx)
        .take(visible_rows)
        .map(|sample| {
            let m = &sample.metrics;
            let total = m.cpu_total_percent();
            let status_style = if m.status.is_complete() {
                Styles::primary()
            } else {
                Styles::warning()
            };
            Row::new(vec![
                Cell::from(sample.index.to_string()).style(Styles::secondary()),
                Cell::from(sample.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S").to_string()),
                Cell::from(sample.pid.to_string()),
                Cell::from(m.cpu_user_percent.to_string()),
                Cell::from(m.cpu_kernel_percent.to_string()),
                Cell::from(Span::styled(total.to_string(), cpu_style(total as f64))),
                Cell::from(rate(m.io_read_bytes_per_sec)),
                Cell::from(rate(m.io_write_bytes_per_sec)),
                Cell::from(bytesize::to_string(m.memory.working_set_size, false)),
            ])
            .style(status_style)
        })
        .collect();

    let title = format!("Recent Samples ({})", events.len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Min(10),
            Constraint::Min(10),
            Constraint::Min(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Styles::border())
            .title(Span::styled(title, Styles::title())),
    );

    f.render_widget(table, area);
}

/// Render the process list with the cursor row highlighted
pub fn render_process_table(
    f: &mut Frame,
    area: Rect,
    processes: &[ProcessEntry],
    cursor: usize,
    target_pid: u32,
) {
    let visible_rows = (area.height as usize).saturating_sub(3).max(1);
    // Keep the cursor on screen.
    let start_idx = cursor.saturating_sub(visible_rows.saturating_sub(1));
    let name_width = (area.width as usize).saturating_sub(2 + 8 + 8 + 12 + 4).max(8);

    let header = Row::new(vec![
        Cell::from("PID"),
        Cell::from("NAME"),
        Cell::from("CPU %"),
        Cell::from("MEMORY"),
    ])
    .style(Styles::header());

    let rows: Vec<Row> = processes
        .iter()
        .enumerate()
        .skip(start_idx)
        .take(visible_rows)
        .map(|(idx, proc)| {
            let row = Row::new(vec![
                Cell::from(proc.pid.to_string()),
                Cell::from(truncate_to_width(&proc.name, name_width)),
                Cell::from(Span::styled(
                    format!("{:.1}", proc.cpu_usage),
                    process_cpu_style(proc.cpu_usage),
                )),
                Cell::from(bytesize::to_string(proc.memory_bytes, false)),
            ]);
            if idx == cursor {
                row.style(Styles::selected())
            } else if proc.pid == target_pid {
                row.style(Styles::emphasis())
            } else {
                row.style(Styles::primary())
            }
        })
        .collect();

    let title = format!("Processes ({})", processes.len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Min(8),
            Constraint::Length(8),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Styles::border())
            .title(Span::styled(title, Styles::title())),
    );

    f.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_to_width("chrome", 10), "chrome");
    }

    #[test]
    fn test_truncate_long_text() {
        assert_eq!(truncate_to_width("svchost.exe", 6), "svcho…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }

    #[test]
    fn test_truncate_wide_chars() {
        // Each CJK character takes two columns.
        let out = truncate_to_width("進程監視器", 5);
        assert_eq!(out, "進程…");
    }
}
