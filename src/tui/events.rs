//! Event handling for TUI

use crate::tui::state::{AppState, Tab};
use crossterm::event::{KeyCode, KeyModifiers, MouseEvent, MouseEventKind};

const PAGE: usize = 10;

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
}

/// Handle a keyboard event
pub fn handle_event(app_state: &mut AppState, key: KeyCode, modifiers: KeyModifiers) -> EventResult {
    if modifiers.contains(KeyModifiers::CONTROL) && matches!(key, KeyCode::Char('c')) {
        return EventResult::Quit;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return EventResult::Quit,
        KeyCode::Tab | KeyCode::Right => app_state.switch_tab(app_state.tab.next()),
        KeyCode::BackTab | KeyCode::Left => app_state.switch_tab(app_state.tab.previous()),
        KeyCode::Char('1') => app_state.switch_tab(Tab::Performance),
        KeyCode::Char('2') => app_state.switch_tab(Tab::Processes),
        KeyCode::Char('3') => app_state.switch_tab(Tab::Analysis),
        KeyCode::Down | KeyCode::Char('j') => app_state.scroll_down(1),
        KeyCode::Up | KeyCode::Char('k') => app_state.scroll_up(1),
        KeyCode::PageDown => app_state.scroll_down(PAGE),
        KeyCode::PageUp => app_state.scroll_up(PAGE),
        KeyCode::Home => app_state.scroll = 0,
        KeyCode::Char('r') | KeyCode::Char('R') if app_state.tab == Tab::Processes => {
            // Forces a refresh on the next loop iteration.
            app_state.processes_refreshed = None;
        }
        _ => {}
    }
    EventResult::Continue
}

/// Handle a mouse event
pub fn handle_mouse_event(app_state: &mut AppState, mouse: MouseEvent) -> EventResult {
    match mouse.kind {
        MouseEventKind::ScrollDown => app_state.scroll_down(1),
        MouseEventKind::ScrollUp => app_state.scroll_up(1),
        _ => {}
    }
    EventResult::Continue
}
