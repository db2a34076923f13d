//! The durable copy of the sidebar: `sidebar/sections.json`.
//!
//! Readers never lock (writes are atomic renames). Every read-modify-write
//! goes through [`update_store`], which holds the advisory lock for the
//! whole cycle and bumps `revision`.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::io::lock::{FileLock, LockError};
use crate::io::recovery::atomic_write;
use crate::model::{Channel, ChannelId, Hierarchy, HierarchyError, Section, SectionId};
use crate::ops::persist::{ChannelOrder, PersistError, PersistenceGateway};

pub const STORE_FILE: &str = "sections.json";

/// Name of the section created for a workspace that has none
pub const DEFAULT_SECTION_NAME: &str = "Channels";

/// Error type for store I/O
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write store: {0}")]
    Write(#[from] io::Error),
    #[error("could not encode store: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("store is inconsistent: {0}")]
    Hierarchy(#[from] HierarchyError),
}

/// A channel as stored on disk.
///
/// `section` mirrors the owning section's list. The list is authoritative;
/// the field is only used to repair channels no list mentions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub id: ChannelId,
    pub name: String,
    #[serde(default)]
    pub section: Option<SectionId>,
    #[serde(default)]
    pub starred: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl ChannelRecord {
    pub fn new(channel: &Channel, section: &SectionId) -> Self {
        ChannelRecord {
            id: channel.id.clone(),
            name: channel.name.clone(),
            section: Some(section.clone()),
            starred: channel.starred.clone(),
            created_at: channel.created_at,
        }
    }

    pub fn to_channel(&self) -> Channel {
        Channel {
            id: self.id.clone(),
            name: self.name.clone(),
            starred: self.starred.clone(),
            created_at: self.created_at,
        }
    }
}

/// The whole contents of sections.json
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDoc {
    /// Bumped on every write
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub channels: Vec<ChannelRecord>,
}

/// A channel that no section listed, appended on load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repair {
    pub channel: ChannelId,
    pub section: SectionId,
}

impl StoreDoc {
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.id == id)
    }

    pub fn section_mut(&mut self, id: &SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| &s.id == id)
    }

    pub fn channel(&self, id: &ChannelId) -> Option<&ChannelRecord> {
        self.channels.iter().find(|c| &c.id == id)
    }

    pub fn channel_mut(&mut self, id: &ChannelId) -> Option<&mut ChannelRecord> {
        self.channels.iter_mut().find(|c| &c.id == id)
    }

    /// Sections sorted by `order`, ties in file order
    pub fn sorted_sections(&self) -> Vec<&Section> {
        let mut sorted: Vec<&Section> = self.sections.iter().collect();
        sorted.sort_by_key(|s| s.order);
        sorted
    }

    /// Rank the listed sections first, in list order, then any sections the
    /// list left out in their current relative order. Unknown ids are
    /// skipped. Returns how many ids were skipped.
    pub fn apply_section_order(&mut self, ordered_section_ids: &[SectionId]) -> usize {
        let now = Utc::now();
        let mut ranked: Vec<SectionId> = Vec::with_capacity(self.sections.len());
        let mut skipped = 0;
        for id in ordered_section_ids {
            if self.section(id).is_none() {
                tracing::warn!(section = %id, "section order names unknown section; skipping");
                skipped += 1;
            } else if !ranked.contains(id) {
                ranked.push(id.clone());
            }
        }
        let rest: Vec<SectionId> = self
            .sorted_sections()
            .into_iter()
            .filter(|s| !ranked.contains(&s.id))
            .map(|s| s.id.clone())
            .collect();
        ranked.extend(rest);

        for (rank, id) in ranked.iter().enumerate() {
            if let Some(section) = self.section_mut(id)
                && section.order != rank
            {
                section.order = rank;
                section.updated_at = now;
            }
        }
        skipped
    }

    /// Replace the channel lists of the source (and, for a transfer, the
    /// destination) section, and point every destination channel at its new
    /// section.
    pub fn apply_channel_order(&mut self, order: &ChannelOrder) -> Result<(), PersistError> {
        for id in [&order.source_section_id, &order.destination_section_id] {
            if self.section(id).is_none() {
                return Err(PersistError::SectionNotFound(id.clone()));
            }
        }

        let now = Utc::now();
        if let Some(source) = self.section_mut(&order.source_section_id) {
            source.channels = order.source_channel_ids.clone();
            source.updated_at = now;
        }
        if order.is_transfer()
            && let Some(dest) = self.section_mut(&order.destination_section_id)
        {
            dest.channels = order.destination_channel_ids.clone();
            dest.updated_at = now;
        }
        for id in &order.destination_channel_ids {
            if let Some(channel) = self.channel_mut(id) {
                channel.section = Some(order.destination_section_id.clone());
            }
        }
        Ok(())
    }

    /// Create the default section when there are none. Returns whether one
    /// was created.
    pub fn ensure_default_section(&mut self, user: &str) -> bool {
        if !self.sections.is_empty() {
            return false;
        }
        let mut section = Section::new(
            crate::model::slugify(DEFAULT_SECTION_NAME),
            DEFAULT_SECTION_NAME,
            0,
        );
        section.created_by = user.to_string();
        self.sections.push(section);
        true
    }

    /// Build the in-memory hierarchy.
    ///
    /// Channels no section lists are appended to the section their `section`
    /// field names, or to the first section. A channel listed twice, or a
    /// listed id with no channel record, is an error.
    pub fn to_hierarchy(&self) -> Result<(Hierarchy, Vec<Repair>), HierarchyError> {
        let mut sections: Vec<Section> = self.sorted_sections().into_iter().cloned().collect();
        let mut repairs = Vec::new();

        for record in &self.channels {
            if sections.iter().any(|s| s.position_of(&record.id).is_some()) {
                continue;
            }
            let target = record
                .section
                .as_ref()
                .and_then(|id| sections.iter().position(|s| &s.id == id))
                .or(if sections.is_empty() { None } else { Some(0) });
            let Some(index) = target else {
                // Left for Hierarchy::new to reject as an orphan.
                continue;
            };
            sections[index].channels.push(record.id.clone());
            repairs.push(Repair {
                channel: record.id.clone(),
                section: sections[index].id.clone(),
            });
        }

        let channels = self.channels.iter().map(ChannelRecord::to_channel).collect();
        let hierarchy = Hierarchy::new(sections, channels)?;
        Ok((hierarchy, repairs))
    }
}

/// Path to sections.json inside a `sidebar/` directory
pub fn store_path(dir: &Path) -> PathBuf {
    dir.join(STORE_FILE)
}

/// Read sections.json. A missing file reads as an empty store.
pub fn read_store(dir: &Path) -> Result<StoreDoc, StoreError> {
    let path = store_path(dir);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoreDoc::default()),
        Err(source) => return Err(StoreError::Read { path, source }),
    };
    serde_json::from_str(&text).map_err(|source| StoreError::Parse { path, source })
}

/// Bump the revision and atomically replace sections.json.
///
/// Callers outside this module should go through [`update_store`], which
/// holds the lock.
pub fn write_store(dir: &Path, doc: &mut StoreDoc) -> Result<(), StoreError> {
    doc.revision += 1;
    let mut json = serde_json::to_string_pretty(doc)?;
    json.push('\n');
    atomic_write(&store_path(dir), json.as_bytes())?;
    Ok(())
}

/// Read, mutate and write the store under the advisory lock.
///
/// Nothing is written when `f` fails.
pub fn update_store<T, E>(dir: &Path, f: impl FnOnce(&mut StoreDoc) -> Result<T, E>) -> Result<T, E>
where
    E: From<StoreError>,
{
    let _lock = FileLock::acquire_default(dir).map_err(StoreError::from)?;
    let mut doc = read_store(dir)?;
    let out = f(&mut doc)?;
    write_store(dir, &mut doc)?;
    Ok(out)
}

/// Load the hierarchy, creating the default section first if the store
/// has none. Repairs are logged, not written back.
pub fn load_hierarchy(dir: &Path, user: &str) -> Result<Hierarchy, StoreError> {
    let mut doc = read_store(dir)?;
    if doc.sections.is_empty() {
        doc = update_store(dir, |doc: &mut StoreDoc| {
            if doc.ensure_default_section(user) {
                tracing::info!(name = DEFAULT_SECTION_NAME, "created default section");
            }
            Ok::<_, StoreError>(doc.clone())
        })?;
    }

    let (hierarchy, repairs) = doc.to_hierarchy()?;
    for repair in &repairs {
        tracing::warn!(
            channel = %repair.channel,
            section = %repair.section,
            "channel was listed in no section; appended"
        );
    }
    tracing::debug!(
        revision = doc.revision,
        sections = hierarchy.sections().len(),
        channels = hierarchy.channel_count(),
        "store loaded"
    );
    Ok(hierarchy)
}

/// [`PersistenceGateway`] over sections.json
#[derive(Debug, Clone)]
pub struct FileGateway {
    dir: PathBuf,
}

impl FileGateway {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileGateway { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PersistenceGateway for FileGateway {
    fn persist_section_order(&self, ordered_section_ids: &[SectionId]) -> Result<(), PersistError> {
        let skipped = update_store(&self.dir, |doc: &mut StoreDoc| {
            Ok::<_, PersistError>(doc.apply_section_order(ordered_section_ids))
        })?;
        tracing::info!(
            sections = ordered_section_ids.len(),
            skipped,
            "section order written"
        );
        Ok(())
    }

    fn persist_channel_order(&self, order: &ChannelOrder) -> Result<(), PersistError> {
        update_store(&self.dir, |doc: &mut StoreDoc| doc.apply_channel_order(order))?;
        tracing::info!(
            source = %order.source_section_id,
            destination = %order.destination_section_id,
            "channel order written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn doc(spec: &[(&str, &[&str])]) -> StoreDoc {
        let mut doc = StoreDoc::default();
        for (i, (sid, cids)) in spec.iter().enumerate() {
            let mut section = Section::new(*sid, sid.to_uppercase(), i);
            for cid in cids.iter() {
                section.channels.push((*cid).into());
                doc.channels
                    .push(ChannelRecord::new(&Channel::new(*cid, *cid), &section.id));
            }
            doc.sections.push(section);
        }
        doc
    }

    fn list(doc: &StoreDoc, section: &str) -> Vec<String> {
        doc.section(&section.into())
            .unwrap()
            .channels
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn section_order_sets_ranks_and_skips_unknown() {
        let mut d = doc(&[("a", &[]), ("b", &[]), ("c", &[]), ("d", &[])]);
        let skipped = d.apply_section_order(&["c".into(), "ghost".into(), "a".into()]);
        assert_eq!(skipped, 1);
        let order: Vec<(&str, usize)> = d
            .sorted_sections()
            .into_iter()
            .map(|s| (s.id.as_str(), s.order))
            .collect();
        // Unlisted sections follow, still contiguous.
        assert_eq!(order, vec![("c", 0), ("a", 1), ("b", 2), ("d", 3)]);
        assert!(crate::ops::check::check_store(&d).warnings.is_empty());
    }

    #[test]
    fn channel_order_transfer_updates_both_lists_and_section_field() {
        let mut d = doc(&[("s1", &["a", "b"]), ("s2", &["c"])]);
        d.apply_channel_order(&ChannelOrder {
            source_section_id: "s1".into(),
            destination_section_id: "s2".into(),
            source_channel_ids: vec!["a".into()],
            destination_channel_ids: vec!["b".into(), "c".into()],
        })
        .unwrap();
        assert_eq!(list(&d, "s1"), vec!["a"]);
        assert_eq!(list(&d, "s2"), vec!["b", "c"]);
        assert_eq!(d.channel(&"b".into()).unwrap().section, Some("s2".into()));
    }

    #[test]
    fn channel_order_same_section_ignores_destination_list() {
        let mut d = doc(&[("s1", &["a", "b"])]);
        d.apply_channel_order(&ChannelOrder {
            source_section_id: "s1".into(),
            destination_section_id: "s1".into(),
            source_channel_ids: vec!["b".into(), "a".into()],
            destination_channel_ids: vec!["b".into(), "a".into()],
        })
        .unwrap();
        assert_eq!(list(&d, "s1"), vec!["b", "a"]);
    }

    #[test]
    fn channel_order_requires_both_sections() {
        let mut d = doc(&[("s1", &["a"])]);
        let before = d.clone();
        let err = d
            .apply_channel_order(&ChannelOrder {
                source_section_id: "s1".into(),
                destination_section_id: "gone".into(),
                source_channel_ids: vec![],
                destination_channel_ids: vec!["a".into()],
            })
            .unwrap_err();
        assert!(matches!(err, PersistError::SectionNotFound(id) if id.as_str() == "gone"));
        assert_eq!(d, before);
    }

    #[test]
    fn orphans_are_repaired_into_their_section_or_the_first() {
        let mut d = doc(&[("s1", &["a"]), ("s2", &["b"])]);
        let mut lost = Channel::new("lost", "lost");
        lost.starred.insert("me".into());
        d.channels.push(ChannelRecord::new(&lost, &"s2".into()));
        let mut stray = ChannelRecord::new(&Channel::new("stray", "stray"), &"s1".into());
        stray.section = Some("deleted".into());
        d.channels.push(stray);

        let (h, repairs) = d.to_hierarchy().unwrap();
        assert_eq!(repairs.len(), 2);
        let names = |s: &str| -> Vec<String> {
            h.section(&s.into())
                .unwrap()
                .channels
                .iter()
                .map(|c| c.to_string())
                .collect()
        };
        assert_eq!(names("s1"), vec!["a", "stray"]);
        assert_eq!(names("s2"), vec!["b", "lost"]);
        assert!(h.channel(&"lost".into()).unwrap().is_starred_by("me"));
    }

    #[test]
    fn double_listing_is_a_load_error() {
        let mut d = doc(&[("s1", &["a"]), ("s2", &[])]);
        d.sections[1].channels.push("a".into());
        assert!(matches!(
            d.to_hierarchy(),
            Err(HierarchyError::InvariantViolation(_))
        ));
    }

    #[test]
    fn load_creates_default_section() {
        let tmp = TempDir::new().unwrap();
        let h = load_hierarchy(tmp.path(), "alice").unwrap();
        assert_eq!(h.sections().len(), 1);
        assert_eq!(h.sections()[0].name, DEFAULT_SECTION_NAME);

        let stored = read_store(tmp.path()).unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.sections[0].created_by, "alice");
        // Second load does not create another.
        load_hierarchy(tmp.path(), "alice").unwrap();
        assert_eq!(read_store(tmp.path()).unwrap().sections.len(), 1);
    }

    #[test]
    fn gateway_writes_bump_revision() {
        let tmp = TempDir::new().unwrap();
        let mut d = doc(&[("s1", &["a"]), ("s2", &[])]);
        write_store(tmp.path(), &mut d).unwrap();

        let gateway = FileGateway::new(tmp.path());
        gateway
            .persist_channel_order(&ChannelOrder {
                source_section_id: "s1".into(),
                destination_section_id: "s2".into(),
                source_channel_ids: vec![],
                destination_channel_ids: vec!["a".into()],
            })
            .unwrap();
        gateway
            .persist_section_order(&["s2".into(), "s1".into()])
            .unwrap();

        let stored = read_store(tmp.path()).unwrap();
        assert_eq!(stored.revision, 3);
        let h = load_hierarchy(tmp.path(), "me").unwrap();
        assert_eq!(h.section_ids(), vec![SectionId::from("s2"), SectionId::from("s1")]);
        assert_eq!(h.owner_of(&"a".into()), Some((0, 0)));
    }

    #[test]
    fn failed_update_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut d = doc(&[("s1", &[])]);
        write_store(tmp.path(), &mut d).unwrap();
        let err = FileGateway::new(tmp.path()).persist_channel_order(&ChannelOrder {
            source_section_id: "nope".into(),
            destination_section_id: "nope".into(),
            source_channel_ids: vec![],
            destination_channel_ids: vec![],
        });
        assert!(err.is_err());
        assert_eq!(read_store(tmp.path()).unwrap().revision, 1);
    }

    #[test]
    fn malformed_store_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(store_path(tmp.path()), "{ not json").unwrap();
        assert!(matches!(read_store(tmp.path()), Err(StoreError::Parse { .. })));
    }
}
