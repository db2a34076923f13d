//! Transient state of an in-progress drag.
//!
//! A [`DragSession`] only annotates the hierarchy for presentation: it names
//! what is being dragged, where it came from, where the pointer is, and what
//! the resolver last made of the targets under the pointer. It never touches
//! the hierarchy itself.

use crate::model::{ChannelId, SectionId};

use super::resolve::{DropTarget, Resolution};

/// A pointer position in terminal cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

impl Position {
    pub fn new(x: u16, y: u16) -> Self {
        Position { x, y }
    }

    pub fn manhattan_distance(self, other: Position) -> u32 {
        u32::from(self.x.abs_diff(other.x)) + u32::from(self.y.abs_diff(other.y))
    }
}

/// The element being dragged
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DragItem {
    Section(SectionId),
    Channel(ChannelId),
}

impl DragItem {
    pub fn kind(&self) -> &'static str {
        match self {
            DragItem::Section(_) => "section",
            DragItem::Channel(_) => "channel",
        }
    }
}

impl std::fmt::Display for DragItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DragItem::Section(id) => write!(f, "section {}", id),
            DragItem::Channel(id) => write!(f, "channel {}", id),
        }
    }
}

/// How a press turns into a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragConfig {
    /// Cells the pointer must travel from the press before the drag starts
    pub threshold_cells: u16,
    /// Whether Escape cancels an active drag
    pub cancel_on_escape: bool,
}

impl Default for DragConfig {
    fn default() -> Self {
        DragConfig {
            threshold_cells: 1,
            cancel_on_escape: true,
        }
    }
}

impl DragConfig {
    pub fn from_ui(ui: &crate::model::UiConfig) -> Self {
        DragConfig {
            threshold_cells: ui.drag_threshold,
            cancel_on_escape: ui.cancel_on_escape,
        }
    }

    /// Whether a pointer that went down at `start` and is now at `current`
    /// has travelled far enough to start dragging.
    pub fn exceeds_threshold(&self, start: Position, current: Position) -> bool {
        start.manhattan_distance(current) >= u32::from(self.threshold_cells)
    }
}

/// One drag gesture, from start to drop or cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub item: DragItem,
    /// Section a dragged channel started in (`None` for section drags)
    pub origin: Option<SectionId>,
    pub start: Position,
    pub current: Position,
    /// Targets under the pointer at the last movement, outermost first
    pub hits: Vec<DropTarget>,
    /// What the resolver made of `hits` at the last movement
    pub target: Resolution,
}

impl DragSession {
    pub fn new(item: DragItem, origin: Option<SectionId>, start: Position) -> Self {
        DragSession {
            item,
            origin,
            start,
            current: start,
            hits: Vec::new(),
            target: Resolution::Ignore,
        }
    }

    /// Delta from start to current position as `(dx, dy)`.
    pub fn delta(&self) -> (i32, i32) {
        (
            i32::from(self.current.x) - i32::from(self.start.x),
            i32::from(self.current.y) - i32::from(self.start.y),
        )
    }
}
