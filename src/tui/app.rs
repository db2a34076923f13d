use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::time::Duration;

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;

use crate::io::logging;
use crate::io::state::{UiState, read_ui_state, write_ui_state};
use crate::io::store::{self, FileGateway};
use crate::io::watcher::StoreWatcher;
use crate::io::workspace_io;
use crate::io::writer::BackgroundWriter;
use crate::model::{Hierarchy, SectionId, WorkspaceConfig};
use crate::ops::drag::{DragConfig, DragItem, Position};
use crate::ops::persist::PersistSink;
use crate::ops::reorder::{DragEnd, DropError, ReorderCoordinator};

use super::input;
use super::layout::{self, Row};
use super::render;
use super::theme::Theme;

/// How long to wait for queued writes on exit
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Keyboard move: the cursor picks a drop row
    Move,
}

/// A left press that has not travelled far enough to become a drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Press {
    pub item: DragItem,
    pub at: Position,
}

/// Keyboard move in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveState {
    pub item: DragItem,
    /// Cursor row when the move started, restored on cancel
    pub origin_row: usize,
}

/// Main application state
pub struct App<S> {
    pub coordinator: ReorderCoordinator<S>,
    pub workspace_name: String,
    pub user: String,
    pub theme: Theme,
    pub show_key_hints: bool,
    pub mode: Mode,
    pub collapsed: BTreeSet<SectionId>,
    pub cursor: usize,
    pub scroll_offset: usize,
    pub press: Option<Press>,
    pub move_state: Option<MoveState>,
    /// Screen area of the list at the last draw, used for hit-testing
    pub list_area: Rect,
    pub should_quit: bool,
}

impl<S: PersistSink> App<S> {
    pub fn new(config: &WorkspaceConfig, hierarchy: Hierarchy, sink: S) -> Self {
        let coordinator =
            ReorderCoordinator::new(hierarchy, sink).with_config(DragConfig::from_ui(&config.ui));
        App {
            coordinator,
            workspace_name: config.workspace.name.clone(),
            user: config.workspace.user.clone(),
            theme: Theme::from_config(&config.ui),
            show_key_hints: config.ui.show_key_hints,
            mode: Mode::Navigate,
            collapsed: BTreeSet::new(),
            cursor: 0,
            scroll_offset: 0,
            press: None,
            move_state: None,
            list_area: Rect::default(),
            should_quit: false,
        }
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        self.coordinator.hierarchy()
    }

    pub fn rows(&self) -> Vec<Row> {
        layout::build_rows(self.hierarchy(), &self.collapsed)
    }

    pub fn cursor_row(&self) -> Option<Row> {
        self.rows().into_iter().nth(self.cursor)
    }

    /// Row index under a screen position, if it is inside the list.
    pub fn row_at(&self, at: Position) -> Option<usize> {
        let area = self.list_area;
        if at.x < area.x || at.x >= area.right() || at.y < area.y || at.y >= area.bottom() {
            return None;
        }
        let index = self.scroll_offset + usize::from(at.y - area.y);
        (index < self.rows().len()).then_some(index)
    }

    pub fn row_of(&self, item: &DragItem) -> Option<usize> {
        self.rows().iter().position(|r| r.holds(item))
    }

    pub fn clamp_cursor(&mut self) {
        let len = self.rows().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Swap in a hierarchy reloaded from disk.
    pub fn replace_hierarchy(&mut self, hierarchy: Hierarchy) {
        self.collapsed.retain(|id| hierarchy.section(id).is_some());
        self.coordinator.replace_hierarchy(hierarchy);
        self.clamp_cursor();
    }

    pub fn toggle_collapsed(&mut self, section: &SectionId) {
        if !self.collapsed.remove(section) {
            self.collapsed.insert(section.clone());
        }
        if let Some(row) = self
            .rows()
            .iter()
            .position(|r| matches!(r, Row::Header { section: s, .. } if s == section))
        {
            self.cursor = row;
        }
    }

    /// Follow the moved item with the cursor after a drop.
    pub fn finish_drop(&mut self, result: Result<DragEnd, DropError>) {
        match result {
            Ok(DragEnd::Committed(commit)) => {
                if let Some(row) = self.row_of(&commit.item) {
                    self.cursor = row;
                }
            }
            Ok(DragEnd::Cancelled(reason)) => {
                tracing::debug!(?reason, "drop cancelled");
            }
            Err(DropError::Drag(e)) => tracing::debug!(error = %e, "drop not started"),
            Err(DropError::Hierarchy(e)) => {
                tracing::error!(error = %e, "drop rejected; sidebar unchanged");
            }
        }
        self.clamp_cursor();
    }

    pub fn restore_ui_state(&mut self, state: UiState) {
        self.collapsed = state
            .collapsed
            .into_iter()
            .filter(|id| self.hierarchy().section(id).is_some())
            .collect();
        self.cursor = state.cursor;
        self.scroll_offset = state.scroll_offset;
        self.clamp_cursor();
    }

    pub fn ui_state(&self) -> UiState {
        UiState {
            collapsed: self.collapsed.clone(),
            cursor: self.cursor,
            scroll_offset: self.scroll_offset,
        }
    }
}

fn save_ui_state<S: PersistSink>(dir: &Path, app: &App<S>) {
    if let Err(e) = write_ui_state(dir, &app.ui_state()) {
        tracing::warn!(error = %e, "could not save ui state");
    }
}

/// Run the TUI application
pub fn run(workspace_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let workspace = workspace_io::open_workspace(workspace_dir)?;
    let dir = workspace.dir.clone();
    logging::init_file(&dir, &workspace.config.log.level)?;

    let writer = BackgroundWriter::spawn(FileGateway::new(&dir), &dir)?;
    let mut app = App::new(&workspace.config, workspace.hierarchy, writer);
    if let Some(state) = read_ui_state(&dir) {
        app.restore_ui_state(state);
    }

    let watcher = match StoreWatcher::start(&dir) {
        Ok(w) => Some(w),
        Err(e) => {
            tracing::warn!(error = %e, "file watcher unavailable; external changes need a restart");
            None
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, &dir, watcher.as_ref());

    save_ui_state(&dir, &app);
    let unfinished = app.coordinator.sink_mut().flush(FLUSH_TIMEOUT);
    tracing::debug!(reported = unfinished.len(), "writer flushed");

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<BackgroundWriter>,
    dir: &Path,
    watcher: Option<&StoreWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reload_pending = false;
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key(app, key),
                Event::Mouse(mouse) => input::handle_mouse(app, mouse),
                _ => {}
            }
        }

        for status in app.coordinator.sink_mut().poll() {
            tracing::debug!(seq = status.seq, ok = status.result.is_ok(), "write finished");
        }

        if let Some(watcher) = watcher
            && !watcher.poll().is_empty()
        {
            reload_pending = true;
        }
        // Reading the store while our own writes are queued would show an
        // older order than the one on screen.
        if reload_pending && app.coordinator.sink().is_idle() {
            reload_pending = false;
            match store::load_hierarchy(dir, &app.user) {
                Ok(hierarchy) => app.replace_hierarchy(hierarchy),
                Err(e) => tracing::warn!(error = %e, "reload failed; keeping current sidebar"),
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::hierarchy::fixtures::hierarchy;
    use crate::ops::persist::PersistRequest;
    use crate::tui::render::test_helpers::app_with;

    #[test]
    fn replace_hierarchy_drops_stale_collapsed_sections() {
        let mut app = app_with(&[("eng", &["deploys"]), ("ops", &[])]);
        app.collapsed.insert("ops".into());
        app.cursor = 2;
        app.replace_hierarchy(hierarchy(&[("eng", &["deploys"])]));
        assert!(app.collapsed.is_empty());
        assert_eq!(app.cursor, 1);
    }

    #[test]
    fn ui_state_round_trips_through_restore() {
        let mut app = app_with(&[("eng", &["deploys"]), ("ops", &[])]);
        app.collapsed.insert("eng".into());
        app.cursor = 1;
        let state = app.ui_state();

        let mut fresh = app_with(&[("eng", &["deploys"]), ("ops", &[])]);
        fresh.restore_ui_state(state);
        assert!(fresh.collapsed.contains(&SectionId::from("eng")));
        assert_eq!(fresh.cursor, 1);
    }

    #[test]
    fn restore_ignores_unknown_sections_and_clamps_cursor() {
        let mut app = app_with(&[("eng", &[])]);
        app.restore_ui_state(UiState {
            collapsed: [SectionId::from("gone")].into_iter().collect(),
            cursor: 40,
            scroll_offset: 0,
        });
        assert!(app.collapsed.is_empty());
        assert_eq!(app.cursor, 1);
    }

    #[test]
    fn row_at_respects_list_area_and_scroll() {
        let mut app = app_with(&[("eng", &["a", "b", "c"])]);
        app.list_area = Rect::new(0, 1, 20, 2);
        app.scroll_offset = 1;
        assert_eq!(app.row_at(Position::new(3, 0)), None);
        assert_eq!(app.row_at(Position::new(3, 1)), Some(1));
        assert_eq!(app.row_at(Position::new(3, 2)), Some(2));
        assert_eq!(app.row_at(Position::new(3, 3)), None);
        assert_eq!(app.row_at(Position::new(25, 1)), None);
    }

    #[test]
    fn toggle_collapsed_keeps_cursor_on_header() {
        let mut app = app_with(&[("eng", &["a", "b"]), ("ops", &["c"])]);
        app.toggle_collapsed(&"ops".into());
        assert_eq!(app.cursor, 3);
        assert_eq!(app.rows().len(), 4);
        let sink: &Vec<PersistRequest> = app.coordinator.sink();
        assert!(sink.is_empty());
    }
}
