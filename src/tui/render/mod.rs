pub mod sidebar;
pub mod status_row;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use crate::model::Hierarchy;
use crate::ops::drag::DragItem;
use crate::ops::persist::PersistSink;
use crate::util::unicode::truncate_to_width;

use super::app::App;

/// Main render function — dispatches to sub-renderers
pub fn render<S: PersistSink>(frame: &mut Frame, app: &mut App<S>) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: title (1 row) | sidebar list | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_title(frame, app, chunks[0]);
    sidebar::render_sidebar(frame, app, chunks[1]);
    status_row::render_status_row(frame, app, chunks[2]);
}

fn render_title<S>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let width = usize::from(area.width).saturating_sub(1);
    let title = Line::from(Span::styled(
        format!(" {}", truncate_to_width(&app.workspace_name, width)),
        Style::default()
            .fg(app.theme.highlight)
            .bg(app.theme.background)
            .add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(title), area);
}

/// Short label for a dragged item: the section name, or `# channel`.
pub(super) fn item_label(hierarchy: &Hierarchy, item: &DragItem) -> String {
    match item {
        DragItem::Section(id) => hierarchy
            .section(id)
            .map_or_else(|| id.to_string(), |s| s.name.clone()),
        DragItem::Channel(id) => {
            let name = hierarchy.channel(id).map_or(id.as_str(), |c| c.name.as_str());
            format!("# {}", name)
        }
    }
}
