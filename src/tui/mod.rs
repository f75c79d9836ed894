//! TUI module for the live dashboard
//!
//! Provides a full-screen terminal UI using Ratatui. The sampling thread
//! feeds a [`Monitor`]; this loop drains it between frames, so slow redraws
//! never hold up sampling.

pub mod events;
pub mod screens;
pub mod state;
pub mod theme;
pub mod widgets;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::{debug, warn};

use self::events::{handle_event, handle_mouse_event, EventResult};
use self::screens::render;
use self::state::AppState;
use crate::config::Config;
use crate::monitor::Monitor;
use crate::processes::ProcessTable;
use crate::store::StatsStore;

const FRAME_POLL: Duration = Duration::from_millis(100);

/// Run the dashboard until the user quits
pub fn run(
    app_state: AppState,
    monitor: Monitor,
    store: Option<StatsStore>,
    config: &Config,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app_state, &monitor, store.as_ref(), config);

    // Restore terminal even if the loop failed
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    monitor.stop();
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app_state: AppState,
    monitor: &Monitor,
    store: Option<&StatsStore>,
    config: &Config,
) -> Result<()> {
    let mut process_table = ProcessTable::new();
    let refresh_every = Duration::from_secs(config.processes.refresh_secs.max(1));

    loop {
        app_state.tick = app_state.tick.wrapping_add(1);

        drain_samples(&mut app_state, monitor, store);

        if !monitor.is_running() && app_state.status_message.is_none() {
            app_state.status_message = Some("sampling stopped".to_string());
        }

        let stale = app_state
            .processes_refreshed
            .map_or(true, |at| at.elapsed() >= refresh_every);
        if stale {
            let processes = process_table.refresh(config.processes.limit);
            debug!(count = processes.len(), "process list refreshed");
            app_state.set_processes(processes);
        }

        terminal.draw(|f| render(f, &app_state))?;

        if event::poll(FRAME_POLL)? {
            if handle_terminal_event(&mut app_state, event::read()?) == EventResult::Quit {
                break;
            }

            // Drain any other pending events to prevent lag (smooth scrolling)
            while event::poll(Duration::from_millis(0))? {
                if handle_terminal_event(&mut app_state, event::read()?) == EventResult::Quit {
                    return Ok(());
                }
            }
        }
    }

    Ok(())
}

fn handle_terminal_event(app_state: &mut AppState, event: Event) -> EventResult {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            handle_event(app_state, key.code, key.modifiers)
        }
        Event::Mouse(mouse) => handle_mouse_event(app_state, mouse),
        _ => EventResult::Continue,
    }
}

/// Move every queued sample into the state, recording each one if a store is attached.
fn drain_samples(app_state: &mut AppState, monitor: &Monitor, store: Option<&StatsStore>) {
    for sample in monitor.try_iter() {
        if let Some(store) = store {
            match store.save(&sample) {
                Ok(_) => app_state.recorded += 1,
                Err(e) => {
                    app_state.record_errors += 1;
                    warn!(index = sample.index, "failed to record sample: {:#}", e);
                }
            }
        }
        app_state.ingest(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{CpuNormalization, IoCounters, Sampler, ScriptedReading, ScriptedSource};

    #[test]
    fn test_drain_samples_records_in_order() {
        let readings = (0..4u64)
            .map(|i| {
                ScriptedReading::new(i * 10_000_000)
                    .cpu(0, i * 1_000_000)
                    .io(IoCounters::default())
            })
            .collect();
        let source = ScriptedSource::new(42, readings);
        let sampler = Sampler::with_source(Box::new(source), CpuNormalization::Raw);
        let monitor = Monitor::spawn(sampler, Duration::from_millis(5)).expect("spawn monitor");
        let store = StatsStore::open_in_memory().expect("open store");

        let mut state = AppState::new(42, "scripted", &Config::default());
        while state.events.len() < 3 {
            match monitor.recv_timeout(Duration::from_secs(2)) {
                Some(sample) => {
                    store.save(&sample).expect("save");
                    state.recorded += 1;
                    state.ingest(sample);
                }
                None => panic!("monitor produced no sample"),
            }
        }
        drain_samples(&mut state, &monitor, Some(&store));
        monitor.stop();

        assert_eq!(state.record_errors, 0);
        assert_eq!(store.count().expect("count"), state.recorded);
        let newest_first: Vec<u64> = state.events.iter().map(|s| s.index).collect();
        let mut sorted = newest_first.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(newest_first, sorted);
    }
}
