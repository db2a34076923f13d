use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::SectionId;

pub const STATE_FILE: &str = ".state.json";

/// Persisted TUI state (written to .state.json)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    /// Sections shown as header only
    #[serde(default)]
    pub collapsed: BTreeSet<SectionId>,
    /// Cursor row
    #[serde(default)]
    pub cursor: usize,
    #[serde(default)]
    pub scroll_offset: usize,
}

/// Read .state.json. Missing or malformed state reads as `None`.
pub fn read_ui_state(dir: &Path) -> Option<UiState> {
    let content = fs::read_to_string(dir.join(STATE_FILE)).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn write_ui_state(dir: &Path, state: &UiState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string_pretty(state)?;
    fs::write(dir.join(STATE_FILE), content)
}
