use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::{Hierarchy, SectionId};
use crate::ops::persist::PersistSink;
use crate::ops::resolve::{self, Container, Resolution};
use crate::tui::app::{App, Mode};
use crate::util::unicode::display_width;

use super::item_label;

/// Render the status row (bottom of screen)
pub fn render_status_row<S: PersistSink>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let bg = app.theme.background;
    let width = usize::from(area.width);

    let (text, hint) = if let Some(session) = app.coordinator.session() {
        let hint = if app.coordinator.config().cancel_on_escape {
            "Esc cancel"
        } else {
            ""
        };
        (
            format!(
                "{} \u{2192} {}",
                item_label(app.hierarchy(), &session.item),
                describe(app.hierarchy(), &session.target)
            ),
            hint,
        )
    } else if app.mode == Mode::Move
        && let Some(state) = &app.move_state
    {
        let hits = app.cursor_row().map(|row| row.hits()).unwrap_or_default();
        let resolution = resolve::resolve(app.hierarchy(), &state.item, &hits);
        (
            format!(
                "MOVE {} \u{2192} {}",
                item_label(app.hierarchy(), &state.item),
                describe(app.hierarchy(), &resolution)
            ),
            "Enter drop  Esc cancel",
        )
    } else if app.show_key_hints {
        (String::new(), "m move  \u{2423} collapse  q quit")
    } else {
        (String::new(), "")
    };

    let mut spans = vec![Span::styled(
        text,
        Style::default().fg(app.theme.text_bright).bg(bg),
    )];
    let content_width: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    let hint_width = display_width(hint);
    if !hint.is_empty() && content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

/// Where a drop would land, in words.
fn describe(hierarchy: &Hierarchy, resolution: &Resolution) -> String {
    let name = |id: &SectionId| {
        hierarchy
            .section(id)
            .map_or_else(|| id.to_string(), |s| s.name.clone())
    };
    match resolution {
        Resolution::Ignore => "no target".to_string(),
        Resolution::ReorderWithinContainer {
            container: Container::Sections,
            to,
            ..
        } => format!("section position {}", to + 1),
        Resolution::ReorderWithinContainer {
            container: Container::Section(section),
            to,
            ..
        } => format!("position {} in {}", to + 1, name(section)),
        Resolution::TransferBeforeItem {
            to_section,
            to_index,
            ..
        } => format!("position {} in {}", to_index + 1, name(to_section)),
        Resolution::TransferToEmptyContainer { to_section, .. } => {
            format!("end of {}", name(to_section))
        }
    }
}
