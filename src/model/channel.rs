use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::ChannelId;

/// A conversation space listed in the sidebar.
///
/// The owning section is not stored here: ownership is the section's
/// channel list, so a channel can never disagree with its container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    /// User ids that starred this channel
    #[serde(default)]
    pub starred: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Channel {
    pub fn new(id: impl Into<ChannelId>, name: impl Into<String>) -> Self {
        Channel {
            id: id.into(),
            name: name.into(),
            starred: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_starred_by(&self, user: &str) -> bool {
        self.starred.contains(user)
    }
}
