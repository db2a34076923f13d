use std::fs;
use std::path::{Path, PathBuf};

use crate::io::store::{self, StoreError};
use crate::model::{Workspace, WorkspaceConfig};

/// Directory holding all chanbar files, relative to the workspace root
pub const SIDEBAR_DIR: &str = "sidebar";
pub const CONFIG_FILE: &str = "workspace.toml";

/// Error type for workspace discovery and loading
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not a chanbar workspace: no sidebar/workspace.toml found (run `cb init`)")]
    NotAWorkspace,
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse workspace.toml: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Find the workspace root by walking up from `start`, looking for
/// `sidebar/workspace.toml`.
pub fn discover_workspace(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(SIDEBAR_DIR).join(CONFIG_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(WorkspaceError::NotAWorkspace);
        }
    }
}

/// Parse `sidebar/workspace.toml`.
pub fn load_config(dir: &Path) -> Result<WorkspaceConfig, WorkspaceError> {
    let path = dir.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|source| WorkspaceError::Read {
        path: path.clone(),
        source,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Load config and hierarchy for the workspace rooted at `root`.
pub fn load_workspace(root: &Path) -> Result<Workspace, WorkspaceError> {
    let dir = root.join(SIDEBAR_DIR);
    if !dir.join(CONFIG_FILE).is_file() {
        return Err(WorkspaceError::NotAWorkspace);
    }
    let config = load_config(&dir)?;
    let hierarchy = store::load_hierarchy(&dir, &config.workspace.user)?;
    Ok(Workspace {
        root: root.to_path_buf(),
        dir,
        config,
        hierarchy,
    })
}

/// Discover from `start` (or the current directory) and load.
pub fn open_workspace(start: Option<&str>) -> Result<Workspace, WorkspaceError> {
    let start = match start {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let root = discover_workspace(&start)?;
    load_workspace(&root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_workspace(root: &Path) {
        let dir = root.join(SIDEBAR_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(CONFIG_FILE),
            "[workspace]\nname = \"Acme\"\nuser = \"alice\"\n",
        )
        .unwrap();
    }

    #[test]
    fn discover_from_root_and_subdirectory() {
        let tmp = TempDir::new().unwrap();
        create_workspace(tmp.path());
        assert_eq!(discover_workspace(tmp.path()).unwrap(), tmp.path());
        let sub = tmp.path().join("a/b");
        fs::create_dir_all(&sub).unwrap();
        assert_eq!(discover_workspace(&sub).unwrap(), tmp.path());
    }

    #[test]
    fn discover_fails_outside_a_workspace() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            discover_workspace(tmp.path()),
            Err(WorkspaceError::NotAWorkspace)
        ));
    }

    #[test]
    fn load_reads_config_and_seeds_default_section() {
        let tmp = TempDir::new().unwrap();
        create_workspace(tmp.path());
        let ws = load_workspace(tmp.path()).unwrap();
        assert_eq!(ws.config.workspace.name, "Acme");
        assert_eq!(ws.hierarchy.sections().len(), 1);
        assert_eq!(ws.hierarchy.sections()[0].created_by, "alice");
        assert!(ws.dir.join(store::STORE_FILE).exists());
    }

    #[test]
    fn bad_config_is_reported() {
        let tmp = TempDir::new().unwrap();
        create_workspace(tmp.path());
        fs::write(
            tmp.path().join(SIDEBAR_DIR).join(CONFIG_FILE),
            "[ui]\ndrag_threshold = \"far\"\n",
        )
        .unwrap();
        assert!(matches!(
            load_workspace(tmp.path()),
            Err(WorkspaceError::ConfigParse(_))
        ));
    }
}
