use serde::Serialize;

use crate::io::store::ChannelRecord;
use crate::model::{Channel, Hierarchy, Section};
use crate::ops::reorder::DragEnd;
use crate::ops::resolve::Resolution;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ChannelJson {
    pub id: String,
    pub name: String,
    pub starred: bool,
}

#[derive(Serialize)]
pub struct SectionJson {
    pub id: String,
    pub name: String,
    pub order: usize,
    pub channels: Vec<ChannelJson>,
}

#[derive(Serialize)]
pub struct SidebarJson {
    pub workspace: String,
    pub sections: Vec<SectionJson>,
}

#[derive(Serialize)]
pub struct StarredJson {
    pub id: String,
    pub name: String,
    pub section: Option<String>,
}

/// Result of `cb mv` / `cb section mv`
#[derive(Serialize)]
pub struct MoveJson {
    pub moved: bool,
    /// `reorder`, `transfer`, or `none`
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    pub sections: Vec<SectionJson>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn channel_to_json(channel: &Channel, user: &str) -> ChannelJson {
    ChannelJson {
        id: channel.id.to_string(),
        name: channel.name.clone(),
        starred: channel.is_starred_by(user),
    }
}

pub fn section_to_json(hierarchy: &Hierarchy, section: &Section, user: &str) -> SectionJson {
    SectionJson {
        id: section.id.to_string(),
        name: section.name.clone(),
        order: section.order,
        channels: hierarchy
            .channels_in(&section.id)
            .into_iter()
            .map(|c| channel_to_json(c, user))
            .collect(),
    }
}

pub fn sidebar_to_json(workspace: &str, hierarchy: &Hierarchy, user: &str) -> SidebarJson {
    SidebarJson {
        workspace: workspace.to_string(),
        sections: hierarchy
            .sections()
            .iter()
            .map(|s| section_to_json(hierarchy, s, user))
            .collect(),
    }
}

pub fn starred_to_json(record: &ChannelRecord) -> StarredJson {
    StarredJson {
        id: record.id.to_string(),
        name: record.name.clone(),
        section: record.section.as_ref().map(|s| s.to_string()),
    }
}

pub fn resolution_kind(resolution: &Resolution) -> &'static str {
    match resolution {
        Resolution::Ignore => "none",
        Resolution::ReorderWithinContainer { .. } => "reorder",
        Resolution::TransferBeforeItem { .. } | Resolution::TransferToEmptyContainer { .. } => {
            "transfer"
        }
    }
}

pub fn move_to_json(end: &DragEnd, hierarchy: &Hierarchy, user: &str) -> MoveJson {
    let (moved, kind, seq) = match end {
        DragEnd::Committed(commit) => (true, resolution_kind(&commit.resolution), Some(commit.seq)),
        DragEnd::Cancelled(_) => (false, "none", None),
    };
    MoveJson {
        moved,
        kind,
        seq,
        sections: sidebar_to_json("", hierarchy, user).sections,
    }
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

/// One line per section header and channel, in sidebar order.
pub fn format_sidebar(hierarchy: &Hierarchy, user: &str) -> String {
    let mut out = String::new();
    for section in hierarchy.sections() {
        out.push_str(&format!("{} ({})\n", section.name, section.id));
        let channels = hierarchy.channels_in(&section.id);
        if channels.is_empty() {
            out.push_str("  (empty)\n");
        }
        for channel in channels {
            let star = if channel.is_starred_by(user) { " *" } else { "" };
            out.push_str(&format!("  # {}{}\n", channel.name, star));
        }
    }
    out
}
