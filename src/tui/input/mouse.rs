use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::ops::drag::Position;
use crate::ops::persist::PersistSink;
use crate::ops::reorder::DropError;
use crate::tui::app::{App, Mode, Press};

/// Handle a mouse event: press arms, travel past the threshold starts the
/// drag, movement re-resolves, release commits.
pub fn handle_mouse<S: PersistSink>(app: &mut App<S>, mouse: MouseEvent) {
    // Keyboard move owns the gesture until it ends.
    if app.mode == Mode::Move {
        return;
    }
    let at = Position::new(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => press(app, at),
        MouseEventKind::Drag(MouseButton::Left) => drag(app, at),
        MouseEventKind::Up(MouseButton::Left) => {
            app.press = None;
            if let Some(result) = app.coordinator.release() {
                app.finish_drop(result.map_err(DropError::from));
            }
        }
        MouseEventKind::ScrollUp => {
            app.scroll_offset = app.scroll_offset.saturating_sub(1);
        }
        MouseEventKind::ScrollDown => {
            let max = app
                .rows()
                .len()
                .saturating_sub(usize::from(app.list_area.height));
            app.scroll_offset = (app.scroll_offset + 1).min(max);
        }
        _ => {}
    }
}

fn press<S: PersistSink>(app: &mut App<S>, at: Position) {
    app.press = None;
    let Some(index) = app.row_at(at) else {
        return;
    };
    app.cursor = index;
    if let Some(item) = app.rows()[index].drag_item() {
        app.press = Some(Press { item, at });
    }
}

fn drag<S: PersistSink>(app: &mut App<S>, at: Position) {
    if !app.coordinator.is_dragging() {
        let Some(press) = &app.press else {
            return;
        };
        if !app.coordinator.config().exceeds_threshold(press.at, at) {
            return;
        }
        let Some(press) = app.press.take() else {
            return;
        };
        if let Err(e) = app.coordinator.begin_drag(press.item, press.at) {
            tracing::debug!(error = %e, "drag not started");
            return;
        }
    }
    let hits = app
        .row_at(at)
        .and_then(|index| app.rows().get(index).map(|row| row.hits()))
        .unwrap_or_default();
    app.coordinator.hover(at, &hits);
}
