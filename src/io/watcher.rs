use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::store::STORE_FILE;

/// Files under `sidebar/` whose changes mean the hierarchy or config must
/// be reloaded.
fn is_relevant(path: &Path, dir: &Path) -> bool {
    if !path.starts_with(dir) {
        return false;
    }
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some(STORE_FILE) | Some("workspace.toml")
    )
}

/// Watches a `sidebar/` directory for changes made by other processes
/// (and by our own background writer).
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<Vec<PathBuf>>,
}

impl StoreWatcher {
    /// Start watching. Call [`poll`](Self::poll) every tick.
    pub fn start(dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let dir_owned = dir.to_path_buf();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else { return };
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                let relevant: Vec<PathBuf> = event
                    .paths
                    .into_iter()
                    .filter(|p| is_relevant(p, &dir_owned))
                    .collect();
                if !relevant.is_empty() {
                    let _ = tx.send(relevant);
                }
            },
            Config::default(),
        )?;

        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        Ok(StoreWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Drain pending events. Returns the changed paths, deduplicated
    /// (empty if nothing changed).
    pub fn poll(&self) -> Vec<PathBuf> {
        let mut changed: Vec<PathBuf> = Vec::new();
        while let Ok(paths) = self.rx.try_recv() {
            for path in paths {
                if !changed.contains(&path) {
                    changed.push(path);
                }
            }
        }
        changed
    }
}
