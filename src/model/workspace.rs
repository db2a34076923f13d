use std::path::PathBuf;

use super::config::WorkspaceConfig;
use super::hierarchy::Hierarchy;

/// A fully loaded workspace
#[derive(Debug)]
pub struct Workspace {
    /// Root directory (parent of `sidebar/`)
    pub root: PathBuf,
    /// Path to the `sidebar/` directory
    pub dir: PathBuf,
    /// Parsed workspace.toml
    pub config: WorkspaceConfig,
    /// Sections and channels, as loaded from sections.json
    pub hierarchy: Hierarchy,
}
