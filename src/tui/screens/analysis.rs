//! AI Analysis tab: findings from a report file followed by general advice

use crate::report::{baseline_recommendations, AnalysisReport, Finding};
use crate::tui::{
    state::{AppState, ReportState},
    theme::Styles,
};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, app_state: &AppState) {
    let lines = build_lines(&app_state.report);
    let scroll = app_state.scroll.min(lines.len().saturating_sub(1)) as u16;

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::border())
                .title(Span::styled("AI Process Usage Analysis", Styles::title())),
        )
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    f.render_widget(paragraph, area);
}

/// Unwrapped line count of the tab for `report`, the Analysis scroll bound.
pub(crate) fn line_count(report: &ReportState) -> usize {
    build_lines(report).len()
}

fn build_lines(report: &ReportState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match report {
        ReportState::NotLoaded => {
            lines.push(Line::from(Span::styled(
                "No analysis loaded. Start with --report <FILE> to show AI findings here.",
                Styles::secondary(),
            )));
            lines.push(Line::default());
        }
        ReportState::Failed { source, error } => {
            lines.push(Line::from(vec![
                Span::styled("Could not load ", Styles::error()),
                Span::styled(source.clone(), Styles::emphasis()),
                Span::styled(format!(": {}", error), Styles::error()),
            ]));
            lines.push(Line::default());
        }
        ReportState::Loaded { source, report } => {
            lines.push(Line::from(vec![
                Span::styled("Source: ", Styles::secondary()),
                Span::styled(source.clone(), Styles::emphasis()),
            ]));
            lines.push(Line::default());
            push_report(&mut lines, report);
        }
    }

    lines.push(Line::from(Span::styled("General Recommendations", Styles::title())));
    for group in baseline_recommendations() {
        lines.push(Line::from(Span::styled(group.title, Styles::header())));
        for (label, details) in group.items {
            lines.push(finding_line(label, details));
        }
    }

    lines
}

fn push_report(lines: &mut Vec<Line<'static>>, report: &AnalysisReport) {
    if report.is_empty() {
        lines.push(Line::from(Span::styled(
            "The report contained no findings.",
            Styles::secondary(),
        )));
        lines.push(Line::default());
        return;
    }

    if let Some(summary) = &report.summary {
        lines.push(Line::from(Span::styled("Summary", Styles::header())));
        lines.push(Line::from(Span::styled(summary.clone(), Styles::primary())));
        lines.push(Line::default());
    }

    for (title, findings) in report.sections() {
        lines.push(Line::from(Span::styled(title, Styles::header())));
        for Finding { label, details } in findings {
            lines.push(finding_line(label, details));
        }
        lines.push(Line::default());
    }
}

fn finding_line(label: &str, details: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled("  • ", Styles::emphasis()),
        Span::styled(format!("{}: ", label), Styles::primary()),
        Span::styled(details.to_string(), Styles::secondary()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::parse_report;

    fn text(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_placeholder_when_not_loaded() {
        let out = text(&build_lines(&ReportState::NotLoaded));
        assert!(out.contains("No analysis loaded"));
        assert!(out.contains("CPU Optimization"));
    }

    #[test]
    fn test_loaded_report_lists_findings() {
        let report = parse_report(
            r#"{"summary":"Browser heavy","keyPoints":[{"label":"Chrome","details":"High CPU"}]}"#,
        )
        .expect("valid report");
        let out = text(&build_lines(&ReportState::Loaded {
            source: "report.txt".to_string(),
            report,
        }));
        assert!(out.contains("Browser heavy"));
        assert!(out.contains("Key Points"));
        assert!(out.contains("Chrome: High CPU"));
    }

    #[test]
    fn test_failed_report_shows_error() {
        let out = text(&build_lines(&ReportState::Failed {
            source: "missing.txt".to_string(),
            error: "not found".to_string(),
        }));
        assert!(out.contains("Could not load missing.txt: not found"));
    }
}
