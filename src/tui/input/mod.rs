mod mouse;
mod move_mode;
mod navigate;

use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::persist::PersistSink;

use super::app::{App, Mode};

pub use mouse::handle_mouse;

/// Handle a key event in the current mode
pub fn handle_key<S: PersistSink>(app: &mut App<S>, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }

    // A pointer gesture in progress owns Escape and swallows everything else.
    if app.press.is_some() || app.coordinator.is_dragging() {
        if key.code == KeyCode::Esc && app.coordinator.config().cancel_on_escape {
            app.press = None;
            app.coordinator.cancel();
        }
        return;
    }

    match app.mode {
        Mode::Navigate => navigate::handle_navigate(app, key),
        Mode::Move => move_mode::handle_move(app, key),
    }
}

/// Cursor movement shared by navigate and move mode. Returns whether the
/// key was a movement key.
fn move_cursor<S: PersistSink>(app: &mut App<S>, key: KeyEvent) -> bool {
    let last = app.rows().len().saturating_sub(1);
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.cursor = app.cursor.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => app.cursor = (app.cursor + 1).min(last),
        KeyCode::Home | KeyCode::Char('g') => app.cursor = 0,
        KeyCode::End | KeyCode::Char('G') => app.cursor = last,
        _ => return false,
    }
    true
}
