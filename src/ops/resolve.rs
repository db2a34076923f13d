//! Drop-target resolution.
//!
//! Turns "what is under the pointer" into one classified outcome against the
//! current hierarchy. Resolution is pure: it reads the hierarchy and never
//! mutates it, so it can run on every pointer movement.

use crate::model::{ChannelId, Hierarchy, SectionId};

use super::drag::DragItem;

/// Something the pointer can be over.
///
/// A section target is the section as a container: its header or its
/// drop zone. A channel target is one channel row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DropTarget {
    Section(SectionId),
    Channel(ChannelId),
}

impl DropTarget {
    /// Nesting depth; deeper targets are more specific.
    pub fn depth(&self) -> u8 {
        match self {
            DropTarget::Section(_) => 0,
            DropTarget::Channel(_) => 1,
        }
    }
}

/// Which ordered dimension a reorder happens in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    /// The list of sections
    Sections,
    /// One section's channel list
    Section(SectionId),
}

/// Classified outcome of a drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing to do: no target, the source itself, a kind mismatch, or an
    /// id the hierarchy no longer knows.
    Ignore,
    /// Source and target share a container; the source takes the target's
    /// position.
    ReorderWithinContainer {
        container: Container,
        from: usize,
        to: usize,
    },
    /// A channel moves into another section, immediately before the target
    /// channel's current position.
    TransferBeforeItem {
        from_section: SectionId,
        from_index: usize,
        to_section: SectionId,
        to_index: usize,
    },
    /// A channel is dropped on another section's container (empty or not)
    /// and goes to the tail of its list.
    TransferToEmptyContainer {
        from_section: SectionId,
        from_index: usize,
        to_section: SectionId,
    },
}

impl Resolution {
    pub fn is_ignore(&self) -> bool {
        matches!(self, Resolution::Ignore)
    }
}

/// Pick the most specific target among those under the pointer.
///
/// `hits` lists overlapping targets outermost first; among equally deep
/// targets the last one (topmost) wins.
pub fn deepest(hits: &[DropTarget]) -> Option<&DropTarget> {
    hits.iter().max_by_key(|t| t.depth())
}

/// Classify dropping `item` onto whatever `hits` describes.
pub fn resolve(hierarchy: &Hierarchy, item: &DragItem, hits: &[DropTarget]) -> Resolution {
    let Some(target) = deepest(hits) else {
        return Resolution::Ignore;
    };

    let resolution = match (item, target) {
        (DragItem::Section(source), DropTarget::Section(dest)) => {
            resolve_section_reorder(hierarchy, source, dest)
        }
        // Sections and channels never share an ordered dimension.
        (DragItem::Section(_), DropTarget::Channel(_)) => Some(Resolution::Ignore),
        (DragItem::Channel(source), DropTarget::Channel(dest)) => {
            resolve_channel_on_channel(hierarchy, source, dest)
        }
        (DragItem::Channel(source), DropTarget::Section(dest)) => {
            resolve_channel_on_section(hierarchy, source, dest)
        }
    };

    resolution.unwrap_or_else(|| {
        tracing::debug!(%item, ?target, "drop target no longer in hierarchy; ignoring");
        Resolution::Ignore
    })
}

fn resolve_section_reorder(
    hierarchy: &Hierarchy,
    source: &SectionId,
    dest: &SectionId,
) -> Option<Resolution> {
    if source == dest {
        return Some(Resolution::Ignore);
    }
    let from = hierarchy.section_index(source)?;
    let to = hierarchy.section_index(dest)?;
    Some(Resolution::ReorderWithinContainer {
        container: Container::Sections,
        from,
        to,
    })
}

fn resolve_channel_on_channel(
    hierarchy: &Hierarchy,
    source: &ChannelId,
    dest: &ChannelId,
) -> Option<Resolution> {
    if source == dest {
        return Some(Resolution::Ignore);
    }
    let (from_si, from_ci) = hierarchy.owner_of(source)?;
    let (to_si, to_ci) = hierarchy.owner_of(dest)?;
    let sections = hierarchy.sections();

    if from_si == to_si {
        Some(Resolution::ReorderWithinContainer {
            container: Container::Section(sections[from_si].id.clone()),
            from: from_ci,
            to: to_ci,
        })
    } else {
        Some(Resolution::TransferBeforeItem {
            from_section: sections[from_si].id.clone(),
            from_index: from_ci,
            to_section: sections[to_si].id.clone(),
            to_index: to_ci,
        })
    }
}

fn resolve_channel_on_section(
    hierarchy: &Hierarchy,
    source: &ChannelId,
    dest: &SectionId,
) -> Option<Resolution> {
    let (from_si, from_ci) = hierarchy.owner_of(source)?;
    let to_si = hierarchy.section_index(dest)?;
    if from_si == to_si {
        // Dropping on its own container is not a transfer.
        return Some(Resolution::Ignore);
    }
    Some(Resolution::TransferToEmptyContainer {
        from_section: hierarchy.sections()[from_si].id.clone(),
        from_index: from_ci,
        to_section: dest.clone(),
    })
}
