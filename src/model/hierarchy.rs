use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::ops::ordered::{self, OrderError};

use super::channel::Channel;
use super::ids::{ChannelId, SectionId};
use super::section::Section;

/// Error type for hierarchy lookups and mutations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("section not found: {0}")]
    SectionNotFound(SectionId),
    #[error("channel not found: {0}")]
    ChannelNotFound(ChannelId),
    /// A mutation would leave a channel with zero or two owners. This is a
    /// logic defect, not a user condition; the model is left unchanged.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error("{0}")]
    Order(#[from] OrderError),
}

/// The full ordered section → channel structure for one workspace.
///
/// Every channel is listed by exactly one section, and section `order`
/// values are the contiguous ranks `0..n`. Both hold after every call.
/// Mutation goes through three methods only, each of which builds the
/// complete next state, validates it, and swaps it in as a single step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy {
    sections: Vec<Section>,
    channels: IndexMap<ChannelId, Channel>,
}

impl Hierarchy {
    /// Build a hierarchy from loaded sections and channels.
    ///
    /// Sections are sorted by their stored `order` (ties keep input order)
    /// and renumbered to contiguous ranks.
    pub fn new(mut sections: Vec<Section>, channels: Vec<Channel>) -> Result<Self, HierarchyError> {
        sections.sort_by_key(|s| s.order);
        renumber(&mut sections);

        let mut map = IndexMap::with_capacity(channels.len());
        for channel in channels {
            if map.contains_key(&channel.id) {
                return Err(HierarchyError::InvariantViolation(format!(
                    "duplicate channel id: {}",
                    channel.id
                )));
            }
            map.insert(channel.id.clone(), channel);
        }

        validate_ownership(&sections, &map)?;
        Ok(Hierarchy {
            sections,
            channels: map,
        })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    pub fn section_index(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|s| &s.id == id)
    }

    pub fn section_ids(&self) -> Vec<SectionId> {
        self.sections.iter().map(|s| s.id.clone()).collect()
    }

    pub fn channel(&self, id: &ChannelId) -> Option<&Channel> {
        self.channels.get(id)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Channels of a section in display order
    pub fn channels_in(&self, section: &SectionId) -> Vec<&Channel> {
        self.section(section)
            .map(|s| s.channels.iter().filter_map(|id| self.channels.get(id)).collect())
            .unwrap_or_default()
    }

    /// `(section index, channel index)` of the section that owns `channel`
    pub fn owner_of(&self, channel: &ChannelId) -> Option<(usize, usize)> {
        self.sections
            .iter()
            .enumerate()
            .find_map(|(si, s)| s.position_of(channel).map(|ci| (si, ci)))
    }

    /// Re-run the ownership and rank checks on the current state.
    pub fn validate(&self) -> Result<(), HierarchyError> {
        validate_ownership(&self.sections, &self.channels)?;
        for (i, s) in self.sections.iter().enumerate() {
            if s.order != i {
                return Err(HierarchyError::InvariantViolation(format!(
                    "section {} has order {} at rank {}",
                    s.id, s.order, i
                )));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Mutators (single writer: the reorder coordinator)
    // -----------------------------------------------------------------------

    /// Move the section at `from` to rank `to`.
    pub(crate) fn reorder_sections(&mut self, from: usize, to: usize) -> Result<(), HierarchyError> {
        let mut next = ordered::move_item(&self.sections, from, to)?;
        renumber(&mut next);
        self.commit(next)
    }

    /// Move a channel from index `from` to index `to` inside one section.
    pub(crate) fn reorder_channels_within_section(
        &mut self,
        section: &SectionId,
        from: usize,
        to: usize,
    ) -> Result<(), HierarchyError> {
        let idx = self
            .section_index(section)
            .ok_or_else(|| HierarchyError::SectionNotFound(section.clone()))?;
        let mut next = self.sections.clone();
        next[idx].channels = ordered::move_item(&self.sections[idx].channels, from, to)?;
        self.commit(next)
    }

    /// Take the channel at `from_index` out of `from` and put it into `to`,
    /// before position `to_index`, or at the tail when `to_index` is `None`.
    ///
    /// Both lists are replaced together, so no reader can observe the
    /// channel in zero or two sections. Returns the moved channel's id.
    pub(crate) fn move_channel_across_sections(
        &mut self,
        from: &SectionId,
        from_index: usize,
        to: &SectionId,
        to_index: Option<usize>,
    ) -> Result<ChannelId, HierarchyError> {
        if from == to {
            return Err(HierarchyError::InvariantViolation(format!(
                "transfer source and destination are both {}",
                from
            )));
        }
        let src = self
            .section_index(from)
            .ok_or_else(|| HierarchyError::SectionNotFound(from.clone()))?;
        let dst = self
            .section_index(to)
            .ok_or_else(|| HierarchyError::SectionNotFound(to.clone()))?;

        let (remaining, moved) = ordered::remove_at(&self.sections[src].channels, from_index)?;
        let dest_channels = match to_index {
            Some(i) => ordered::insert_at(&self.sections[dst].channels, i, moved.clone())?,
            None => ordered::append(&self.sections[dst].channels, moved.clone()),
        };

        let mut next = self.sections.clone();
        next[src].channels = remaining;
        next[dst].channels = dest_channels;
        self.commit(next)?;
        Ok(moved)
    }

    fn commit(&mut self, next: Vec<Section>) -> Result<(), HierarchyError> {
        validate_ownership(&next, &self.channels)?;
        self.sections = next;
        Ok(())
    }
}

fn renumber(sections: &mut [Section]) {
    for (i, s) in sections.iter_mut().enumerate() {
        s.order = i;
    }
}

fn validate_ownership(
    sections: &[Section],
    channels: &IndexMap<ChannelId, Channel>,
) -> Result<(), HierarchyError> {
    let mut seen_sections = HashSet::new();
    let mut owners: HashMap<&ChannelId, &SectionId> = HashMap::new();

    for section in sections {
        if !seen_sections.insert(&section.id) {
            return Err(HierarchyError::InvariantViolation(format!(
                "duplicate section id: {}",
                section.id
            )));
        }
        for channel in &section.channels {
            if !channels.contains_key(channel) {
                return Err(HierarchyError::InvariantViolation(format!(
                    "section {} lists unknown channel {}",
                    section.id, channel
                )));
            }
            if let Some(other) = owners.insert(channel, &section.id) {
                return Err(HierarchyError::InvariantViolation(format!(
                    "channel {} is listed in both {} and {}",
                    channel, other, section.id
                )));
            }
        }
    }

    if let Some(orphan) = channels.keys().find(|id| !owners.contains_key(id)) {
        return Err(HierarchyError::InvariantViolation(format!(
            "channel {} has no section",
            orphan
        )));
    }
    Ok(())
}
