//! Creating, renaming and deleting sections and channels, and starring.
//!
//! These work on the durable copy, never on a live [`Hierarchy`]. A running
//! UI sees the result through the file watcher.
//!
//! [`Hierarchy`]: crate::model::Hierarchy

use chrono::Utc;

use crate::io::store::{ChannelRecord, StoreDoc, StoreError};
use crate::model::{Channel, ChannelId, Section, SectionId, unique_slug};

/// Error type for section and channel administration
#[derive(Debug, thiserror::Error)]
pub enum SectionError {
    #[error("section not found: {0}")]
    SectionNotFound(SectionId),
    #[error("channel not found: {0}")]
    ChannelNotFound(ChannelId),
    #[error("name must not be empty")]
    EmptyName,
    #[error("cannot delete {0}: it is the last section")]
    LastSection(SectionId),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn clean_name(name: &str) -> Result<String, SectionError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SectionError::EmptyName);
    }
    Ok(name.to_string())
}

/// Append a new section after all others.
pub fn new_section(doc: &mut StoreDoc, name: &str, user: &str) -> Result<SectionId, SectionError> {
    let name = clean_name(name)?;
    let taken: Vec<&str> = doc.sections.iter().map(|s| s.id.as_str()).collect();
    let id = SectionId::new(unique_slug(&crate::model::slugify(&name), &taken));

    let mut section = Section::new(id.clone(), name, doc.sections.len());
    section.created_by = user.to_string();
    doc.sections.push(section);
    renumber(doc);
    Ok(id)
}

/// Delete a section. Its channels move, in order, to the end of the first
/// remaining section.
///
/// Returns the section that received them.
pub fn delete_section(doc: &mut StoreDoc, id: &SectionId) -> Result<SectionId, SectionError> {
    let index = doc
        .sections
        .iter()
        .position(|s| &s.id == id)
        .ok_or_else(|| SectionError::SectionNotFound(id.clone()))?;
    if doc.sections.len() == 1 {
        return Err(SectionError::LastSection(id.clone()));
    }

    let removed = doc.sections.remove(index);
    renumber(doc);
    let heir_id = doc.sorted_sections()[0].id.clone();
    if let Some(heir) = doc.section_mut(&heir_id) {
        heir.channels.extend(removed.channels.iter().cloned());
        heir.updated_at = Utc::now();
    }
    for channel in &removed.channels {
        if let Some(record) = doc.channel_mut(channel) {
            record.section = Some(heir_id.clone());
        }
    }
    Ok(heir_id)
}

pub fn rename_section(doc: &mut StoreDoc, id: &SectionId, name: &str) -> Result<(), SectionError> {
    let name = clean_name(name)?;
    let section = doc
        .section_mut(id)
        .ok_or_else(|| SectionError::SectionNotFound(id.clone()))?;
    section.name = name;
    section.updated_at = Utc::now();
    Ok(())
}

/// Create a channel at the end of `section`.
pub fn new_channel(
    doc: &mut StoreDoc,
    name: &str,
    section: &SectionId,
) -> Result<ChannelId, SectionError> {
    let name = clean_name(name)?;
    if doc.section(section).is_none() {
        return Err(SectionError::SectionNotFound(section.clone()));
    }
    let taken: Vec<&str> = doc.channels.iter().map(|c| c.id.as_str()).collect();
    let id = ChannelId::new(unique_slug(&crate::model::slugify(&name), &taken));

    doc.channels
        .push(ChannelRecord::new(&Channel::new(id.clone(), name), section));
    if let Some(owner) = doc.section_mut(section) {
        owner.channels.push(id.clone());
        owner.updated_at = Utc::now();
    }
    Ok(id)
}

/// Star a channel for `user`. Returns false if it was already starred.
pub fn star_channel(doc: &mut StoreDoc, id: &ChannelId, user: &str) -> Result<bool, SectionError> {
    let channel = doc
        .channel_mut(id)
        .ok_or_else(|| SectionError::ChannelNotFound(id.clone()))?;
    Ok(channel.starred.insert(user.to_string()))
}

/// Returns false if the channel was not starred.
pub fn unstar_channel(doc: &mut StoreDoc, id: &ChannelId, user: &str) -> Result<bool, SectionError> {
    let channel = doc
        .channel_mut(id)
        .ok_or_else(|| SectionError::ChannelNotFound(id.clone()))?;
    Ok(channel.starred.remove(user))
}

/// Channels starred by `user`, in sidebar order.
pub fn starred_channels<'a>(doc: &'a StoreDoc, user: &str) -> Vec<&'a ChannelRecord> {
    doc.sorted_sections()
        .into_iter()
        .flat_map(|s| s.channels.iter())
        .filter_map(|id| doc.channel(id))
        .filter(|c| c.starred.contains(user))
        .collect()
}

/// Rewrite `order` as contiguous ranks, keeping the current relative order.
fn renumber(doc: &mut StoreDoc) {
    let ranked: Vec<SectionId> = doc.sorted_sections().iter().map(|s| s.id.clone()).collect();
    for (rank, id) in ranked.iter().enumerate() {
        if let Some(section) = doc.section_mut(id) {
            section.order = rank;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seeded() -> StoreDoc {
        let mut doc = StoreDoc::default();
        doc.ensure_default_section("me");
        doc
    }

    fn channels_of(doc: &StoreDoc, section: &SectionId) -> Vec<String> {
        doc.section(section)
            .unwrap()
            .channels
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn new_section_appends_with_unique_slug() {
        let mut doc = seeded();
        let a = new_section(&mut doc, "  Eng Team ", "alice").unwrap();
        let b = new_section(&mut doc, "Eng team", "alice").unwrap();
        assert_eq!(a.as_str(), "eng-team");
        assert_eq!(b.as_str(), "eng-team-2");
        let s = doc.section(&a).unwrap();
        assert_eq!(s.name, "Eng Team");
        assert_eq!(s.order, 1);
        assert_eq!(s.created_by, "alice");
        assert_eq!(doc.section(&b).unwrap().order, 2);
    }

    #[test]
    fn empty_names_are_rejected() {
        let mut doc = seeded();
        assert!(matches!(new_section(&mut doc, "   ", "me"), Err(SectionError::EmptyName)));
        let first = doc.sections[0].id.clone();
        assert!(matches!(
            new_channel(&mut doc, "", &first),
            Err(SectionError::EmptyName)
        ));
        assert!(matches!(
            rename_section(&mut doc, &first, "\t"),
            Err(SectionError::EmptyName)
        ));
    }

    #[test]
    fn new_channel_goes_to_the_tail() {
        let mut doc = seeded();
        let s = doc.sections[0].id.clone();
        new_channel(&mut doc, "general", &s).unwrap();
        new_channel(&mut doc, "random", &s).unwrap();
        assert_eq!(channels_of(&doc, &s), vec!["general", "random"]);
        assert_eq!(doc.channel(&"random".into()).unwrap().section, Some(s.clone()));
        assert!(matches!(
            new_channel(&mut doc, "x", &"nope".into()),
            Err(SectionError::SectionNotFound(_))
        ));
    }

    #[test]
    fn delete_section_hands_channels_to_first_remaining() {
        let mut doc = seeded();
        let first = doc.sections[0].id.clone();
        let eng = new_section(&mut doc, "Eng", "me").unwrap();
        let ops = new_section(&mut doc, "Ops", "me").unwrap();
        new_channel(&mut doc, "general", &first).unwrap();
        new_channel(&mut doc, "deploys", &eng).unwrap();
        new_channel(&mut doc, "builds", &eng).unwrap();

        let heir = delete_section(&mut doc, &eng).unwrap();
        assert_eq!(heir, first);
        assert_eq!(channels_of(&doc, &first), vec!["general", "deploys", "builds"]);
        assert_eq!(doc.channel(&"builds".into()).unwrap().section, Some(first.clone()));
        assert_eq!(doc.section(&ops).unwrap().order, 1);

        let (h, repairs) = doc.to_hierarchy().unwrap();
        assert!(repairs.is_empty());
        h.validate().unwrap();
    }

    #[test]
    fn cannot_delete_last_section() {
        let mut doc = seeded();
        let only = doc.sections[0].id.clone();
        assert!(matches!(
            delete_section(&mut doc, &only),
            Err(SectionError::LastSection(_))
        ));
        assert!(matches!(
            delete_section(&mut doc, &"ghost".into()),
            Err(SectionError::SectionNotFound(_))
        ));
    }

    #[test]
    fn starring_is_per_user_and_listed_in_sidebar_order() {
        let mut doc = seeded();
        let first = doc.sections[0].id.clone();
        let top = new_section(&mut doc, "Top", "me").unwrap();
        doc.apply_section_order(&[top.clone(), first.clone()]);
        new_channel(&mut doc, "general", &first).unwrap();
        new_channel(&mut doc, "news", &top).unwrap();

        assert!(star_channel(&mut doc, &"general".into(), "me").unwrap());
        assert!(!star_channel(&mut doc, &"general".into(), "me").unwrap());
        star_channel(&mut doc, &"news".into(), "me").unwrap();
        star_channel(&mut doc, &"news".into(), "bob").unwrap();

        let mine: Vec<&str> = starred_channels(&doc, "me").iter().map(|c| c.name.as_str()).collect();
        assert_eq!(mine, vec!["news", "general"]);
        assert_eq!(starred_channels(&doc, "bob").len(), 1);

        assert!(unstar_channel(&mut doc, &"news".into(), "me").unwrap());
        assert!(!unstar_channel(&mut doc, &"news".into(), "me").unwrap());
        assert!(matches!(
            star_channel(&mut doc, &"nope".into(), "me"),
            Err(SectionError::ChannelNotFound(_))
        ));
    }
}
