//! Flattened sidebar rows and pointer hit-testing.

use std::collections::BTreeSet;

use crate::model::{ChannelId, Hierarchy, SectionId};
use crate::ops::drag::DragItem;
use crate::ops::resolve::DropTarget;

/// One visible line of the sidebar list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Header { section: SectionId, collapsed: bool },
    Channel { section: SectionId, channel: ChannelId },
    /// Stand-in row for a section with no channels, so it can still be
    /// dropped onto
    EmptyZone { section: SectionId },
}

impl Row {
    pub fn section(&self) -> &SectionId {
        match self {
            Row::Header { section, .. }
            | Row::Channel { section, .. }
            | Row::EmptyZone { section } => section,
        }
    }

    /// Targets under a pointer on this row, outermost first.
    pub fn hits(&self) -> Vec<DropTarget> {
        match self {
            Row::Header { section, .. } | Row::EmptyZone { section } => {
                vec![DropTarget::Section(section.clone())]
            }
            Row::Channel { section, channel } => vec![
                DropTarget::Section(section.clone()),
                DropTarget::Channel(channel.clone()),
            ],
        }
    }

    /// What pressing on this row would pick up
    pub fn drag_item(&self) -> Option<DragItem> {
        match self {
            Row::Header { section, .. } => Some(DragItem::Section(section.clone())),
            Row::Channel { channel, .. } => Some(DragItem::Channel(channel.clone())),
            Row::EmptyZone { .. } => None,
        }
    }

    pub fn holds(&self, item: &DragItem) -> bool {
        self.drag_item().as_ref() == Some(item)
    }
}

/// Flatten the hierarchy into display rows. Collapsed sections show their
/// header only.
pub fn build_rows(hierarchy: &Hierarchy, collapsed: &BTreeSet<SectionId>) -> Vec<Row> {
    let mut rows = Vec::with_capacity(hierarchy.sections().len() + hierarchy.channel_count());
    for section in hierarchy.sections() {
        let is_collapsed = collapsed.contains(&section.id);
        rows.push(Row::Header {
            section: section.id.clone(),
            collapsed: is_collapsed,
        });
        if is_collapsed {
            continue;
        }
        if section.is_empty() {
            rows.push(Row::EmptyZone {
                section: section.id.clone(),
            });
        }
        for channel in &section.channels {
            rows.push(Row::Channel {
                section: section.id.clone(),
                channel: channel.clone(),
            });
        }
    }
    rows
}
