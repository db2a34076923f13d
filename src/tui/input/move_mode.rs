use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::persist::PersistSink;
use crate::ops::reorder::DragEnd;
use crate::tui::app::{App, Mode, MoveState};

use super::move_cursor;

/// Enter MOVE mode for the header or channel under the cursor.
pub(super) fn enter_move_mode<S: PersistSink>(app: &mut App<S>) {
    let Some(item) = app.cursor_row().and_then(|row| row.drag_item()) else {
        return;
    };
    app.move_state = Some(MoveState {
        item,
        origin_row: app.cursor,
    });
    app.mode = Mode::Move;
}

pub(super) fn handle_move<S: PersistSink>(app: &mut App<S>, key: KeyEvent) {
    if move_cursor(app, key) {
        return;
    }
    match key.code {
        KeyCode::Enter | KeyCode::Char('m') => {
            let Some(state) = app.move_state.take() else {
                app.mode = Mode::Navigate;
                return;
            };
            app.mode = Mode::Navigate;
            let hits = app.cursor_row().map(|row| row.hits()).unwrap_or_default();
            let result = app.coordinator.drop_onto(state.item, &hits);
            if !matches!(result, Ok(DragEnd::Committed(_))) {
                app.cursor = state.origin_row;
            }
            app.finish_drop(result);
        }
        KeyCode::Esc => {
            if let Some(state) = app.move_state.take() {
                app.cursor = state.origin_row;
            }
            app.mode = Mode::Navigate;
            app.clamp_cursor();
        }
        _ => {}
    }
}
