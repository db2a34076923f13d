use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ChannelId, SectionId};

/// A named, ordered container of channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    /// Rank among sibling sections (contiguous, zero-based once loaded)
    pub order: usize,
    /// Channels in display order. The section owns this ordering.
    #[serde(default)]
    pub channels: Vec<ChannelId>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Section {
    pub fn new(id: impl Into<SectionId>, name: impl Into<String>, order: usize) -> Self {
        let now = Utc::now();
        Section {
            id: id.into(),
            name: name.into(),
            order,
            channels: Vec::new(),
            created_by: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Position of a channel in this section's list
    pub fn position_of(&self, channel: &ChannelId) -> Option<usize> {
        self.channels.iter().position(|c| c == channel)
    }
}
