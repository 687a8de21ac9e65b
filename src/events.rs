use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::app::{App, View};

/// File written by the in-app export key.
pub const EXPORT_PATH: &str = "imgproxy_doctor_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Metrics),
        KeyCode::Char('2') => app.set_view(View::Reports),
        KeyCode::Char('3') => app.set_view(View::Moderation),
        KeyCode::Char('4') => app.set_view(View::Info),

        // Columns and rows
        KeyCode::Left | KeyCode::Char('h') => app.prev_column(),
        KeyCode::Right | KeyCode::Char('l') => app.next_column(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev_n(1),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_n(1),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),

        // Sorting
        KeyCode::Enter | KeyCode::Char('s') => app.activate_sort(),

        // Re-fetch reports
        KeyCode::Char('r') => app.request_reports(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Export
        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_PATH);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev_n(1),
        MouseEventKind::ScrollDown => app.select_next_n(1),

        // Tab clicks (row 1, after header)
        MouseEventKind::Down(MouseButton::Left) if mouse.row == 1 => {
            if let Some(view) = View::at_tab_column(mouse.column) {
                app.set_view(view);
            }
        }

        _ => {}
    }
}
