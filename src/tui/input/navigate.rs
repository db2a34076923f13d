use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ops::persist::PersistSink;
use crate::tui::app::App;
use crate::tui::layout::Row;

use super::move_cursor;
use super::move_mode::enter_move_mode;

pub(super) fn handle_navigate<S: PersistSink>(app: &mut App<S>, key: KeyEvent) {
    if move_cursor(app, key) {
        return;
    }
    match (key.modifiers, key.code) {
        (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            app.should_quit = true;
        }
        (_, KeyCode::Char('m')) => enter_move_mode(app),
        (_, KeyCode::Enter) | (_, KeyCode::Char(' ')) => {
            if let Some(row) = app.cursor_row() {
                let section = row.section().clone();
                app.toggle_collapsed(&section);
            }
        }
        (_, KeyCode::Left) | (_, KeyCode::Char('h')) => {
            if let Some(row) = app.cursor_row()
                && !app.collapsed.contains(row.section())
            {
                let section = row.section().clone();
                app.toggle_collapsed(&section);
            }
        }
        (_, KeyCode::Right) | (_, KeyCode::Char('l')) => {
            if let Some(Row::Header {
                section,
                collapsed: true,
            }) = app.cursor_row()
            {
                app.toggle_collapsed(&section);
            }
        }
        _ => {}
    }
}
