use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::io::store::StoreDoc;
use crate::model::{ChannelId, SectionId};

/// Structured result from `cb check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// Something that makes the store unloadable or ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckError {
    /// A channel is listed by more than one section
    DoubleListed {
        channel_id: ChannelId,
        section_ids: Vec<SectionId>,
    },
    /// A section lists an id with no channel record
    UnknownChannel {
        section_id: SectionId,
        channel_id: ChannelId,
    },
    DuplicateSection { section_id: SectionId },
    DuplicateChannel { channel_id: ChannelId },
    /// A channel record that no section lists
    Orphan { channel_id: ChannelId },
}

/// Something the next load or write will quietly fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckWarning {
    /// Section `order` values are not exactly `0..n`
    NonContiguousOrder { orders: Vec<usize> },
    /// A channel's `section` field names a section other than the one
    /// listing it
    SectionMismatch {
        channel_id: ChannelId,
        listed_in: SectionId,
        recorded: Option<SectionId>,
    },
}

/// Validate the durable copy. Read-only.
pub fn check_store(doc: &StoreDoc) -> CheckResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let mut seen_sections = HashSet::new();
    for section in &doc.sections {
        if !seen_sections.insert(&section.id) {
            errors.push(CheckError::DuplicateSection {
                section_id: section.id.clone(),
            });
        }
    }

    let mut records = HashSet::new();
    for channel in &doc.channels {
        if !records.insert(&channel.id) {
            errors.push(CheckError::DuplicateChannel {
                channel_id: channel.id.clone(),
            });
        }
    }

    // channel -> sections listing it, in sidebar order
    let mut owners: HashMap<&ChannelId, Vec<&SectionId>> = HashMap::new();
    for section in doc.sorted_sections() {
        for channel in &section.channels {
            if !records.contains(channel) {
                errors.push(CheckError::UnknownChannel {
                    section_id: section.id.clone(),
                    channel_id: channel.clone(),
                });
            }
            owners.entry(channel).or_default().push(&section.id);
        }
    }

    let mut reported = HashSet::new();
    for section in doc.sorted_sections() {
        for channel in &section.channels {
            if let Some(listed) = owners.get(channel)
                && listed.len() > 1
                && reported.insert(channel)
            {
                errors.push(CheckError::DoubleListed {
                    channel_id: channel.clone(),
                    section_ids: listed.iter().map(|s| (*s).clone()).collect(),
                });
            }
        }
    }

    for record in &doc.channels {
        match owners.get(&record.id).and_then(|listed| listed.first()) {
            None => errors.push(CheckError::Orphan {
                channel_id: record.id.clone(),
            }),
            Some(owner) if record.section.as_ref() != Some(*owner) => {
                warnings.push(CheckWarning::SectionMismatch {
                    channel_id: record.id.clone(),
                    listed_in: (*owner).clone(),
                    recorded: record.section.clone(),
                });
            }
            Some(_) => {}
        }
    }

    let mut orders: Vec<usize> = doc.sections.iter().map(|s| s.order).collect();
    orders.sort_unstable();
    if orders.iter().enumerate().any(|(i, o)| i != *o) {
        warnings.push(CheckWarning::NonContiguousOrder { orders });
    }

    CheckResult {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}
