//! The facade the presentation layer drives.
//!
//! Every mutation is routed through here so that (i) the active tab's
//! command log is the one receiving the command, (ii) subscribed hosts see a
//! [`CoreEvent`] for each observable change, and (iii) failures surface
//! through the single [`crate::CoreError`] taxonomy. The facade owns the tab
//! manager, the project search engine, the background indexer, and the
//! session stores; collaborators (clipboard, close-confirmation policy) are
//! injected.

use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::EditCommand;
use crate::error::{CoreError, CoreResult};
use crate::events::{CoreEvent, EventCallback, SearchJobId};
use crate::indexer::{BackgroundIndexer, IndexHit};
use crate::project_search::{
    ProjectResult, ProjectSearch, ProjectSearchConfig, ReplaceOutcome,
};
use crate::search::{self, SearchMatch, SearchOptions};
use crate::selection_set::{Clipboard, InMemoryClipboard};
use crate::session::{FileState, WorkspaceManager, WorkspaceState};
use crate::settings::WorkspaceSettings;
use crate::tabs::{CloseDecision, ClosePolicy, EditorTab, TabManager};

/// The engine facade: multi-tab editing, search, indexing, and session
/// state behind one narrow surface.
pub struct EditorCore {
    tabs: TabManager,
    clipboard: Box<dyn Clipboard>,
    close_policy: Option<Box<dyn ClosePolicy>>,
    project_search: ProjectSearch,
    indexer: BackgroundIndexer,
    workspace: WorkspaceManager,
    settings: WorkspaceSettings,
    finder_options: SearchOptions,
    callbacks: Vec<EventCallback>,
    search_completion_emitted: bool,
}

impl EditorCore {
    /// An engine with one empty tab. Recent-file lists are persisted under
    /// `config_dir`.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            tabs: TabManager::new(),
            clipboard: Box::new(InMemoryClipboard::default()),
            close_policy: None,
            project_search: ProjectSearch::new(),
            indexer: BackgroundIndexer::new(),
            workspace: WorkspaceManager::new(config_dir),
            settings: WorkspaceSettings::default(),
            finder_options: SearchOptions::default(),
            callbacks: Vec::new(),
            search_completion_emitted: true,
        }
    }

    /// Subscribe to engine events.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&CoreEvent) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    fn emit(&mut self, event: CoreEvent) {
        for callback in &mut self.callbacks {
            callback(&event);
        }
    }

    /// Replace the clipboard collaborator.
    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        self.clipboard = clipboard;
    }

    /// Install the close-confirmation policy collaborator.
    pub fn set_close_policy(&mut self, policy: Box<dyn ClosePolicy>) {
        self.close_policy = Some(policy);
    }

    // ------------------------------------------------------------------
    // Tabs
    // ------------------------------------------------------------------

    /// The tab manager (read-only).
    pub fn tabs(&self) -> &TabManager {
        &self.tabs
    }

    /// The active tab.
    pub fn active_tab(&self) -> &EditorTab {
        self.tabs.active()
    }

    /// The active tab, mutably. Direct buffer edits through this bypass the
    /// command log; prefer the facade operations.
    pub fn active_tab_mut(&mut self) -> &mut EditorTab {
        self.tabs.active_mut()
    }

    /// Open an empty tab and activate it.
    pub fn new_tab(&mut self) -> usize {
        let index = self.tabs.new_tab(b"", None);
        self.emit(CoreEvent::TabOpened { tab: index });
        index
    }

    /// Open `path` in a new tab. Line endings are normalised to `\n`; the
    /// file is recorded as recently used.
    pub fn open_file(&mut self, path: &Path) -> CoreResult<usize> {
        let raw = fs::read(path).map_err(|err| CoreError::io(path, err))?;
        let content = normalize_line_endings(&raw);

        let index = self.tabs.new_tab(&content, Some(path.to_path_buf()));
        self.workspace.add_recent_file(path);
        self.emit(CoreEvent::TabOpened { tab: index });
        Ok(index)
    }

    /// Write the tab at `index` back to its file path.
    pub fn save_tab(&mut self, index: usize) -> CoreResult<()> {
        let tab = self
            .tabs
            .get_mut(index)
            .ok_or_else(|| CoreError::NotFound(format!("tab {}", index)))?;
        let path = tab
            .file_path
            .clone()
            .ok_or_else(|| CoreError::NotFound("tab has no file path".into()))?;

        fs::write(&path, tab.buffer.to_bytes()).map_err(|err| CoreError::io(&path, err))?;
        tab.dirty = false;
        Ok(())
    }

    /// Write the active tab back to its file path.
    pub fn save_active(&mut self) -> CoreResult<()> {
        self.save_tab(self.tabs.active_index())
    }

    /// Save the active tab under `path`, adopting it as the tab's file.
    pub fn save_active_as(&mut self, path: &Path) -> CoreResult<()> {
        self.tabs.active_mut().set_file_path(Some(path.to_path_buf()));
        self.workspace.add_recent_file(path);
        self.save_active()
    }

    /// Close the tab at `index`, consulting the close policy when the tab
    /// holds unsaved changes.
    ///
    /// With `require_nonempty` set, closing the last tab fails with
    /// `Conflict`; pass `false` to permit it (the released tab is replaced
    /// with a fresh empty one). Returns `Ok(false)` when the policy
    /// cancelled the close. Fails with `Conflict` when a dirty tab has no
    /// policy installed.
    pub fn close_tab(&mut self, index: usize, require_nonempty: bool) -> CoreResult<bool> {
        let tab = self
            .tabs
            .get(index)
            .ok_or_else(|| CoreError::NotFound(format!("tab {}", index)))?;

        if tab.dirty {
            let Some(policy) = self.close_policy.as_mut() else {
                return Err(CoreError::Conflict(
                    "tab has unsaved changes and no close policy is installed".into(),
                ));
            };
            match policy.confirm_discard(tab) {
                CloseDecision::Cancel => return Ok(false),
                CloseDecision::Save => self.save_tab(index)?,
                CloseDecision::Discard => {}
            }
        }

        if !self.tabs.close_tab(index, require_nonempty) {
            return Err(CoreError::Conflict("cannot close the last tab".into()));
        }
        self.emit(CoreEvent::TabClosed { tab: index });
        Ok(true)
    }

    /// Activate the tab at `index`.
    pub fn set_active_tab(&mut self, index: usize) -> CoreResult<()> {
        if !self.tabs.set_active(index) {
            return Err(CoreError::NotFound(format!("tab {}", index)));
        }
        Ok(())
    }

    /// Activate the next tab, wrapping.
    pub fn next_tab(&mut self) {
        self.tabs.next();
    }

    /// Activate the previous tab, wrapping.
    pub fn previous_tab(&mut self) {
        self.tabs.previous();
    }

    /// Move a tab to a new position, keeping the active tab the same tab.
    pub fn move_tab(&mut self, from: usize, to: usize) -> CoreResult<()> {
        if !self.tabs.move_tab(from, to) {
            return Err(CoreError::NotFound(format!("tab {} or {}", from, to)));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Insert `bytes` at every caret of the active tab, as one undo step.
    pub fn insert(&mut self, bytes: &[u8]) -> CoreResult<()> {
        let index = self.tabs.active_index();
        let tab = self.tabs.active_mut();
        tab.cursors.insert(&mut tab.buffer, &mut tab.log, bytes)?;
        tab.dirty = true;

        self.emit(CoreEvent::DocumentChanged { tab: index });
        self.emit(CoreEvent::CursorMoved { tab: index });
        Ok(())
    }

    /// Backspace at every caret of the active tab.
    pub fn delete_left(&mut self) -> CoreResult<()> {
        let index = self.tabs.active_index();
        let tab = self.tabs.active_mut();
        tab.cursors.delete_left(&mut tab.buffer, &mut tab.log)?;
        tab.dirty = true;

        self.emit(CoreEvent::DocumentChanged { tab: index });
        self.emit(CoreEvent::CursorMoved { tab: index });
        Ok(())
    }

    /// Forward-delete at every caret of the active tab.
    pub fn delete_right(&mut self) -> CoreResult<()> {
        let index = self.tabs.active_index();
        let tab = self.tabs.active_mut();
        tab.cursors.delete_right(&mut tab.buffer, &mut tab.log)?;
        tab.dirty = true;

        self.emit(CoreEvent::DocumentChanged { tab: index });
        Ok(())
    }

    /// Undo the latest command on the active tab. Returns `false` when the
    /// history is empty.
    pub fn undo(&mut self) -> CoreResult<bool> {
        let index = self.tabs.active_index();
        let tab = self.tabs.active_mut();
        let undone = tab.log.undo(&mut tab.buffer)?;
        if undone {
            tab.dirty = true;
            let len = tab.buffer.len();
            if tab.cursors.primary() > len {
                tab.cursors.set_position(len);
            }
            self.emit(CoreEvent::DocumentChanged { tab: index });
        }
        Ok(undone)
    }

    /// Redo the most recently undone command on the active tab.
    pub fn redo(&mut self) -> CoreResult<bool> {
        let index = self.tabs.active_index();
        let tab = self.tabs.active_mut();
        let redone = tab.log.redo(&mut tab.buffer)?;
        if redone {
            tab.dirty = true;
            self.emit(CoreEvent::DocumentChanged { tab: index });
        }
        Ok(redone)
    }

    // ------------------------------------------------------------------
    // Cursors and selection
    // ------------------------------------------------------------------

    /// Move the primary cursor, collapsing the selection. Positions past the
    /// end of the buffer clamp to it.
    pub fn move_cursor(&mut self, position: usize) {
        let index = self.tabs.active_index();
        let tab = self.tabs.active_mut();
        tab.cursors.set_position(position.min(tab.buffer.len()));
        self.emit(CoreEvent::CursorMoved { tab: index });
    }

    /// Set the primary selection (clamped to the buffer).
    pub fn set_selection(&mut self, anchor: usize, head: usize) {
        let index = self.tabs.active_index();
        let tab = self.tabs.active_mut();
        let len = tab.buffer.len();
        tab.cursors.set_selection(anchor.min(len), head.min(len));
        self.emit(CoreEvent::SelectionChanged { tab: index });
    }

    /// Add an extra caret at `position` (clamped to the buffer).
    pub fn add_cursor(&mut self, position: usize) {
        let index = self.tabs.active_index();
        let tab = self.tabs.active_mut();
        tab.cursors.add_cursor(position.min(tab.buffer.len()));
        self.emit(CoreEvent::SelectionChanged { tab: index });
    }

    /// Drop every extra caret.
    pub fn clear_extra_cursors(&mut self) {
        let index = self.tabs.active_index();
        self.tabs.active_mut().cursors.clear_extras();
        self.emit(CoreEvent::SelectionChanged { tab: index });
    }

    /// Select the whole active buffer.
    pub fn select_all(&mut self) {
        let index = self.tabs.active_index();
        let tab = self.tabs.active_mut();
        tab.cursors.select_all(&tab.buffer);
        self.emit(CoreEvent::SelectionChanged { tab: index });
    }

    /// Grow the multi-cursor set with the next occurrence of the primary
    /// selection. Returns `false` when nothing was added.
    pub fn add_next_occurrence(&mut self) -> CoreResult<bool> {
        let index = self.tabs.active_index();
        let tab = self.tabs.active_mut();
        let added = tab.cursors.add_next_occurrence(&tab.buffer)?;
        if added {
            self.emit(CoreEvent::SelectionChanged { tab: index });
        }
        Ok(added)
    }

    /// Copy the primary selection to the clipboard.
    pub fn copy(&mut self) -> CoreResult<()> {
        let tab = self.tabs.active();
        tab.cursors.copy(&tab.buffer, self.clipboard.as_mut())
    }

    /// Cut the primary selection to the clipboard.
    pub fn cut(&mut self) -> CoreResult<()> {
        let index = self.tabs.active_index();
        let had_selection = self.tabs.active().cursors.selection().is_some();

        let tab = self.tabs.active_mut();
        tab.cursors
            .cut(&mut tab.buffer, &mut tab.log, self.clipboard.as_mut())?;

        if had_selection {
            self.tabs.active_mut().dirty = true;
            self.emit(CoreEvent::DocumentChanged { tab: index });
        }
        Ok(())
    }

    /// Paste the clipboard at every caret.
    pub fn paste(&mut self) -> CoreResult<()> {
        let index = self.tabs.active_index();
        let tab = self.tabs.active_mut();
        tab.cursors
            .paste(&mut tab.buffer, &mut tab.log, self.clipboard.as_mut())?;
        tab.dirty = true;
        self.emit(CoreEvent::DocumentChanged { tab: index });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Find / replace in the active buffer
    // ------------------------------------------------------------------

    /// Current finder options.
    pub fn finder_options(&self) -> SearchOptions {
        self.finder_options
    }

    /// Replace the finder options.
    pub fn set_finder_options(&mut self, options: SearchOptions) {
        self.finder_options = options;
    }

    /// All matches of `needle` in the active buffer.
    pub fn find_all(&self, needle: &[u8]) -> CoreResult<Vec<SearchMatch>> {
        let haystack = self.tabs.active().buffer.to_bytes();
        search::find_all(&haystack, needle, self.finder_options)
    }

    /// First match of `needle` at or after `start_pos`.
    pub fn find_next(&self, needle: &[u8], start_pos: usize) -> CoreResult<Option<SearchMatch>> {
        let haystack = self.tabs.active().buffer.to_bytes();
        search::find_next(&haystack, needle, start_pos, self.finder_options)
    }

    /// Highest-offset match of `needle` before `start_pos`.
    pub fn find_previous(
        &self,
        needle: &[u8],
        start_pos: usize,
    ) -> CoreResult<Option<SearchMatch>> {
        let haystack = self.tabs.active().buffer.to_bytes();
        search::find_previous(&haystack, needle, start_pos, self.finder_options)
    }

    /// Find the next match after the current selection (or cursor) and
    /// select it. Returns the match, if any.
    pub fn find_next_and_select(&mut self, needle: &[u8]) -> CoreResult<Option<SearchMatch>> {
        let from = self
            .active_tab()
            .cursors
            .selection()
            .map(|sel| sel.end())
            .unwrap_or_else(|| self.active_tab().cursors.primary());

        let Some(found) = self.find_next(needle, from)? else {
            return Ok(None);
        };
        self.set_selection(found.position, found.position + found.length);
        Ok(Some(found))
    }

    /// Find the nearest match before the current selection (or cursor) and
    /// select it. Returns the match, if any.
    pub fn find_previous_and_select(
        &mut self,
        needle: &[u8],
    ) -> CoreResult<Option<SearchMatch>> {
        let from = self
            .active_tab()
            .cursors
            .selection()
            .map(|sel| sel.start())
            .unwrap_or_else(|| self.active_tab().cursors.primary());

        let Some(found) = self.find_previous(needle, from)? else {
            return Ok(None);
        };
        self.set_selection(found.position, found.position + found.length);
        Ok(Some(found))
    }

    /// Replace one match in the active buffer, as an undoable step.
    pub fn replace_current(
        &mut self,
        m: &SearchMatch,
        replacement: &[u8],
    ) -> CoreResult<()> {
        let index = self.tabs.active_index();
        let tab = self.tabs.active_mut();

        let children = vec![
            EditCommand::delete(m.position, m.length),
            EditCommand::insert(m.position, replacement),
        ];
        tab.log
            .execute(&mut tab.buffer, EditCommand::composite(children))?;
        tab.dirty = true;

        self.emit(CoreEvent::DocumentChanged { tab: index });
        Ok(())
    }

    /// Replace every match of `needle` in the active buffer, as a single
    /// undoable step. Returns the number of replacements.
    pub fn replace_all(&mut self, needle: &[u8], replacement: &[u8]) -> CoreResult<usize> {
        let index = self.tabs.active_index();
        let haystack = self.tabs.active().buffer.to_bytes();
        let matches = search::find_all(&haystack, needle, self.finder_options)?;
        if matches.is_empty() {
            return Ok(0);
        }

        // Children from the last match backward keep earlier positions valid.
        let mut children = Vec::with_capacity(matches.len() * 2);
        for m in matches.iter().rev() {
            children.push(EditCommand::delete(m.position, m.length));
            children.push(EditCommand::insert(m.position, replacement));
        }

        let tab = self.tabs.active_mut();
        tab.log
            .execute(&mut tab.buffer, EditCommand::composite(children))?;
        tab.dirty = true;

        self.emit(CoreEvent::DocumentChanged { tab: index });
        Ok(matches.len())
    }

    // ------------------------------------------------------------------
    // Project search
    // ------------------------------------------------------------------

    /// Launch a project-wide search job.
    pub fn start_project_search(&mut self, config: ProjectSearchConfig) -> CoreResult<SearchJobId> {
        let job = self.project_search.start(config)?;
        self.search_completion_emitted = false;
        self.emit(CoreEvent::SearchProgress { job });
        Ok(job)
    }

    /// Cancel the running project-search job, keeping results appended so
    /// far.
    pub fn cancel_project_search(&mut self) {
        self.project_search.cancel();
    }

    /// Whether a project-search job is still running. Emits
    /// [`CoreEvent::SearchCompleted`] the first time a finished job is
    /// observed.
    pub fn poll_project_search(&mut self) -> bool {
        let in_progress = self.project_search.in_progress();
        if !in_progress && !self.search_completion_emitted {
            if let Some(job) = self.project_search.current_job() {
                self.search_completion_emitted = true;
                self.emit(CoreEvent::SearchCompleted { job });
            }
        }
        in_progress
    }

    /// Snapshot of the project-search results streamed so far.
    pub fn project_results(&self) -> Vec<ProjectResult> {
        self.project_search.results()
    }

    /// Project-search results grouped by file.
    pub fn project_results_by_file(
        &self,
    ) -> std::collections::BTreeMap<PathBuf, Vec<ProjectResult>> {
        self.project_search.results_by_file()
    }

    /// Rewrite every file holding a result, then refresh the search.
    pub fn replace_in_files(
        &mut self,
        query: &str,
        replacement: &str,
    ) -> CoreResult<ReplaceOutcome> {
        let outcome = self.project_search.replace_in_files(query, replacement)?;
        if let Some(job) = self.project_search.current_job() {
            self.search_completion_emitted = false;
            self.emit(CoreEvent::SearchProgress { job });
        }
        Ok(outcome)
    }

    /// Open the file a project-search result points at (activating its tab
    /// if already open) and place the cursor on the occurrence.
    pub fn open_project_result(&mut self, result: &ProjectResult) -> CoreResult<usize> {
        self.open_location(&result.file_path, result.line, result.column)
    }

    /// Open the file an index hit points at (activating its tab if already
    /// open) and place the cursor on the token.
    pub fn open_index_hit(&mut self, hit: &IndexHit) -> CoreResult<usize> {
        self.open_location(&hit.file_path, hit.line, hit.column)
    }

    fn open_location(&mut self, path: &Path, line: usize, column: usize) -> CoreResult<usize> {
        let index = match self.tabs.index_of_path(path) {
            Some(index) => {
                self.tabs.set_active(index);
                index
            }
            None => self.open_file(path)?,
        };

        let tab = self.tabs.active_mut();
        let position = tab
            .buffer
            .line_start(line)
            .map(|start| start + column)
            .unwrap_or_else(|| tab.buffer.len())
            .min(tab.buffer.len());
        tab.cursors.set_position(position);
        tab.viewport.scroll_to(line, &tab.buffer);

        self.emit(CoreEvent::CursorMoved { tab: index });
        Ok(index)
    }

    // ------------------------------------------------------------------
    // Indexer and session
    // ------------------------------------------------------------------

    /// The background indexer.
    pub fn indexer(&self) -> &BackgroundIndexer {
        &self.indexer
    }

    /// The background indexer, mutably (for `start`/`stop`).
    pub fn indexer_mut(&mut self) -> &mut BackgroundIndexer {
        &mut self.indexer
    }

    /// The workspace/session store (recent files, recent workspaces).
    pub fn workspace(&self) -> &WorkspaceManager {
        &self.workspace
    }

    /// The workspace/session store, mutably.
    pub fn workspace_mut(&mut self) -> &mut WorkspaceManager {
        &mut self.workspace
    }

    /// Current workspace settings.
    pub fn settings(&self) -> &WorkspaceSettings {
        &self.settings
    }

    /// Replace the workspace settings.
    pub fn set_settings(&mut self, settings: WorkspaceSettings) {
        self.settings = settings;
    }

    /// Load the optional settings file of `workspace_dir`. A missing file
    /// leaves the defaults in place.
    pub fn load_workspace_settings(&mut self, workspace_dir: &Path) -> CoreResult<()> {
        let file = WorkspaceManager::settings_file(workspace_dir);
        if !file.exists() {
            self.settings = WorkspaceSettings::default();
            return Ok(());
        }
        self.settings = WorkspaceSettings::load(&file)?;
        Ok(())
    }

    /// Persist the current settings for `workspace_dir`.
    pub fn save_workspace_settings(&self, workspace_dir: &Path) -> CoreResult<()> {
        let file = WorkspaceManager::settings_file(workspace_dir);
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir).map_err(|err| CoreError::io(dir, err))?;
        }
        self.settings.save(&file)
    }

    /// Persist the open tabs (those backed by files), cursor positions,
    /// scroll offsets, and the active tab for `workspace_dir`.
    pub fn save_session(&mut self, workspace_dir: &Path) -> CoreResult<()> {
        let mut open_files = Vec::new();
        let mut active_tab_index = 0usize;

        for (index, tab) in self.tabs.tabs().iter().enumerate() {
            let Some(path) = tab.file_path.as_ref() else {
                continue;
            };
            if index == self.tabs.active_index() {
                active_tab_index = open_files.len();
            }
            open_files.push(FileState {
                path: path.to_string_lossy().into_owned(),
                cursor_pos: tab.cursors.primary(),
                scroll_offset: tab.viewport.top_line(),
            });
        }

        let root = workspace_dir.to_string_lossy().into_owned();
        let state = WorkspaceState {
            root_directory: root.clone(),
            root_folders: vec![root],
            open_files,
            active_tab_index,
        };

        self.workspace.save_workspace(&state, workspace_dir)
    }

    /// Restore a persisted session: reopen each still-existing file with its
    /// cursor and scroll position, and reactivate the saved tab.
    pub fn load_session(&mut self, workspace_dir: &Path) -> CoreResult<()> {
        let state = self.workspace.load_workspace(workspace_dir)?;

        self.tabs.close_all();
        let mut opened = 0usize;

        for file in &state.open_files {
            let path = PathBuf::from(&file.path);
            let raw = match fs::read(&path) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "skipping unreadable session file");
                    continue;
                }
            };
            let content = normalize_line_endings(&raw);

            let index = self.tabs.new_tab(&content, Some(path));
            let tab = self.tabs.get_mut(index).expect("just created");
            tab.cursors
                .set_position(file.cursor_pos.min(tab.buffer.len()));
            tab.viewport.scroll_to(file.scroll_offset, &tab.buffer);

            opened += 1;
            self.emit(CoreEvent::TabOpened { tab: index });
        }

        if opened > 0 {
            // Drop the placeholder tab close_all left behind.
            self.tabs.close_tab(0, true);
            let clamped = state.active_tab_index.min(self.tabs.len() - 1);
            self.tabs.set_active(clamped);
        }

        Ok(())
    }
}

// CRLF and lone CR both become LF; the core only ever sees `\n`.
fn normalize_line_endings(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'\r' {
            out.push(b'\n');
            if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                i += 1;
            }
        } else {
            out.push(bytes[i]);
        }
        i += 1;
    }
    out
}
