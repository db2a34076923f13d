use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph};

use crate::ops::drag::DragSession;
use crate::ops::persist::PersistSink;
use crate::ops::resolve;
use crate::tui::app::{App, Mode};
use crate::tui::layout::Row;
use crate::util::unicode::{display_width, truncate_to_width};

use super::item_label;

const STAR: &str = " \u{2605}";

/// Rows marked during a drag or keyboard move
#[derive(Debug, Default, PartialEq, Eq)]
struct Marks {
    source: Option<usize>,
    target: Option<usize>,
}

/// Render the section/channel list. Also records the list area for
/// hit-testing and scrolls the cursor into view.
pub fn render_sidebar<S: PersistSink>(frame: &mut Frame, app: &mut App<S>, area: Rect) {
    app.list_area = area;
    let rows = app.rows();
    let height = usize::from(area.height);

    if app.cursor < app.scroll_offset {
        app.scroll_offset = app.cursor;
    } else if height > 0 && app.cursor >= app.scroll_offset + height {
        app.scroll_offset = app.cursor + 1 - height;
    }
    app.scroll_offset = app.scroll_offset.min(rows.len().saturating_sub(height));

    let marked = marks(app, &rows);
    let dragging = app.coordinator.is_dragging();
    let lines: Vec<Line> = rows
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(height)
        .map(|(i, row)| {
            let style = if marked.target == Some(i) {
                Style::default()
                    .fg(app.theme.background)
                    .bg(app.theme.drop_target)
            } else if marked.source == Some(i) {
                Style::default()
                    .fg(app.theme.dim)
                    .add_modifier(Modifier::DIM)
            } else if i == app.cursor && !dragging && app.mode == Mode::Navigate {
                Style::default().bg(app.theme.selection_bg)
            } else {
                Style::default()
            };
            row_line(app, row, usize::from(area.width)).patch_style(style)
        })
        .collect();

    let paragraph = Paragraph::new(lines).style(Style::default().bg(app.theme.background));
    frame.render_widget(paragraph, area);

    if let Some(session) = app.coordinator.session() {
        render_proxy(frame, app, session);
    }
}

fn marks<S: PersistSink>(app: &App<S>, rows: &[Row]) -> Marks {
    if let Some(session) = app.coordinator.session() {
        let source = rows.iter().position(|r| r.holds(&session.item));
        let target = if session.target.is_ignore() {
            None
        } else {
            rows.iter().position(|r| r.hits() == session.hits)
        };
        return Marks { source, target };
    }
    if app.mode == Mode::Move
        && let Some(state) = &app.move_state
    {
        let source = rows.iter().position(|r| r.holds(&state.item));
        let target = rows.get(app.cursor).and_then(|row| {
            let resolution = resolve::resolve(app.hierarchy(), &state.item, &row.hits());
            (!resolution.is_ignore()).then_some(app.cursor)
        });
        return Marks { source, target };
    }
    Marks::default()
}

fn row_line<'a, S: PersistSink>(app: &App<S>, row: &Row, width: usize) -> Line<'a> {
    let theme = &app.theme;
    let hierarchy = app.coordinator.hierarchy();
    match row {
        Row::Header { section, collapsed } => {
            let arrow = if *collapsed { "\u{25B8}" } else { "\u{25BE}" };
            let name = hierarchy
                .section(section)
                .map_or(section.as_str(), |s| s.name.as_str());
            Line::from(Span::styled(
                format!("{} {}", arrow, truncate_to_width(name, width.saturating_sub(2))),
                Style::default()
                    .fg(theme.text_bright)
                    .add_modifier(Modifier::BOLD),
            ))
        }
        Row::Channel { channel, .. } => {
            let Some(record) = hierarchy.channel(channel) else {
                return Line::from(format!("  # {}", channel));
            };
            let starred = record.is_starred_by(&app.user);
            let budget = width.saturating_sub(4 + if starred { display_width(STAR) } else { 0 });
            let mut spans = vec![Span::styled(
                format!("  # {}", truncate_to_width(&record.name, budget)),
                Style::default().fg(theme.text),
            )];
            if starred {
                spans.push(Span::styled(STAR, Style::default().fg(theme.star)));
            }
            Line::from(spans)
        }
        Row::EmptyZone { .. } => Line::from(Span::styled(
            "  (empty)",
            Style::default()
                .fg(theme.dim)
                .add_modifier(Modifier::ITALIC),
        )),
    }
}

/// Floating copy of the dragged item, just right of the pointer.
fn render_proxy<S: PersistSink>(frame: &mut Frame, app: &App<S>, session: &DragSession) {
    let screen = frame.area();
    let x = session.current.x.saturating_add(2);
    let y = session.current.y;
    if x >= screen.right() || y >= screen.bottom() {
        return;
    }
    let label = format!(" {} ", item_label(app.coordinator.hierarchy(), &session.item));
    let label_width = u16::try_from(display_width(&label)).unwrap_or(u16::MAX);
    let rect = Rect::new(x, y, label_width.min(screen.right() - x), 1);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(Span::styled(
            label,
            Style::default()
                .fg(app.theme.background)
                .bg(app.theme.drop_target)
                .add_modifier(Modifier::BOLD),
        )),
        rect,
    );
}
