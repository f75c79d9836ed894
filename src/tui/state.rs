//! Application state management for TUI

use crate::chart::CpuSeries;
use crate::config::Config;
use crate::monitor::Sample;
use crate::processes::ProcessEntry;
use crate::report::AnalysisReport;
use crate::tui::screens::analysis;
use std::collections::VecDeque;
use std::time::Instant;

/// Dashboard tab being displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Performance,
    Processes,
    Analysis,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Performance, Tab::Processes, Tab::Analysis];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Performance => "Performance",
            Tab::Processes => "Processes",
            Tab::Analysis => "AI Analysis",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn next(&self) -> Tab {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Tab {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Report slot of the Analysis tab
#[derive(Debug, Clone, Default)]
pub enum ReportState {
    #[default]
    NotLoaded,
    Loaded {
        source: String,
        report: AnalysisReport,
    },
    Failed {
        source: String,
        error: String,
    },
}

/// Everything the dashboard renders. Owned by the UI loop.
#[derive(Debug, Clone)]
pub struct AppState {
    pub tab: Tab,
    pub pid: u32,
    pub target_name: String,
    pub series: CpuSeries,
    /// Newest first
    pub events: VecDeque<Sample>,
    pub max_events: usize,
    pub latest: Option<Sample>,
    pub processes: Vec<ProcessEntry>,
    pub processes_refreshed: Option<Instant>,
    /// Set through `set_report` so the Analysis row count follows it
    pub report: ReportState,
    analysis_rows: usize,
    /// Scroll offset of the active tab
    pub scroll: usize,
    pub recorded: u64,
    pub record_errors: u64,
    pub status_message: Option<String>,
    pub tick: u64,
}

impl AppState {
    pub fn new(pid: u32, target_name: impl Into<String>, config: &Config) -> Self {
        Self {
            tab: Tab::default(),
            pid,
            target_name: target_name.into(),
            series: CpuSeries::new(config.chart.points),
            events: VecDeque::with_capacity(config.table.max_rows),
            max_events: config.table.max_rows.max(1),
            latest: None,
            processes: Vec::new(),
            processes_refreshed: None,
            report: ReportState::default(),
            analysis_rows: analysis::line_count(&ReportState::default()),
            scroll: 0,
            recorded: 0,
            record_errors: 0,
            status_message: None,
            tick: 0,
        }
    }

    /// Feed one sample into the chart and the events table.
    pub fn ingest(&mut self, sample: Sample) {
        self.series.push(sample.metrics.cpu_total_percent() as f64);
        self.events.push_front(sample);
        self.events.truncate(self.max_events);
        self.latest = Some(sample);
    }

    pub fn set_processes(&mut self, processes: Vec<ProcessEntry>) {
        self.processes = processes;
        self.processes_refreshed = Some(Instant::now());
        if self.tab == Tab::Processes {
            self.scroll = self.scroll.min(self.processes.len().saturating_sub(1));
        }
    }

    pub fn set_report(&mut self, report: ReportState) {
        self.analysis_rows = analysis::line_count(&report);
        self.report = report;
        if self.tab == Tab::Analysis {
            self.scroll = self.scroll.min(self.analysis_rows.saturating_sub(1));
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        if self.tab != tab {
            self.tab = tab;
            self.scroll = 0;
        }
    }

    /// Number of scrollable rows on the active tab
    pub fn row_count(&self) -> usize {
        match self.tab {
            Tab::Performance => self.events.len(),
            Tab::Processes => self.processes.len(),
            Tab::Analysis => self.analysis_rows,
        }
    }

    pub fn scroll_down(&mut self, by: usize) {
        let max = self.row_count().saturating_sub(1);
        self.scroll = self.scroll.saturating_add(by).min(max);
    }

    pub fn scroll_up(&mut self, by: usize) {
        self.scroll = self.scroll.saturating_sub(by);
    }
}
