use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Dispatch a terminal event to the app.
pub fn handle_event(app: &mut App, event: Event, now: Instant) {
    match event {
        Event::Key(key) => handle_key_event(app, key, now),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::FocusGained => app.set_focus(true, now),
        Event::FocusLost => app.set_focus(false, now),
        // Terminal will redraw on next iteration
        _ => {}
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent, now: Instant) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),

        KeyCode::Char('1') => app.set_view(View::Overview),
        KeyCode::Char('2') => app.set_view(View::Analytics),
        KeyCode::Char('3') => app.set_view(View::Guilds),
        KeyCode::Char('4') => app.set_view(View::Settings),

        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),

        KeyCode::Enter => app.activate(),
        KeyCode::Char(' ') => app.toggle_selected(),
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        KeyCode::Char('r') => {
            app.refresh(now);
        }
        KeyCode::Char('R') if app.current_view == View::Guilds => app.reset_selected_guild(now),
        KeyCode::Char('B') if app.current_view == View::Settings => app.reload_bot(now),

        KeyCode::Char('x') => app.dismiss_toast(now),
        KeyCode::Char('X') => app.dismiss_all_toasts(now),

        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => {
            let export_path = std::path::PathBuf::from("dashboard_export.json");
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()), now);
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e), now);
                }
            }
        }

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        // Tab bar is row 1, after the header
        MouseEventKind::Down(MouseButton::Left) if mouse.row == 1 => {
            if let Some(view) = tab_at(mouse.column) {
                app.set_view(view);
            }
        }

        MouseEventKind::Down(MouseButton::Right) => app.go_back(),

        _ => {}
    }
}

/// Map a column in the tab bar to its view, using the rendered tab widths.
fn tab_at(column: u16) -> Option<View> {
    let mut start = 0u16;
    for view in View::ALL {
        // "N:Label" padded by one space each side
        let width = view.label().len() as u16 + 4;
        if column < start + width {
            return Some(view);
        }
        // divider
        start += width + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_hit_testing() {
        assert_eq!(tab_at(0), Some(View::Overview));
        assert_eq!(tab_at(11), Some(View::Overview));
        assert_eq!(tab_at(14), Some(View::Analytics));
        assert_eq!(tab_at(30), Some(View::Guilds));
        assert_eq!(tab_at(200), None);
    }
}
