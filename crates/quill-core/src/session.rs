//! Session persistence: the per-workspace state file and per-user MRU lists.
//!
//! The workspace file is strict JSON stored under `<workspace>/.quill/`:
//! root directory, root folders, one entry per open tab (path, cursor, scroll
//! offset), and the active tab index. Unknown fields are ignored on read.
//!
//! Recent files and recent workspaces are one-absolute-path-per-line files
//! under a per-user config directory; entries that no longer exist on disk
//! are silently dropped at load time. The config directory is injected so
//! tests stay hermetic.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Directory created inside a workspace to hold its state file.
pub const WORKSPACE_DIR: &str = ".quill";
/// Name of the workspace state file.
pub const WORKSPACE_FILE: &str = "workspace.json";
/// Name of the optional per-workspace settings file.
pub const SETTINGS_FILE: &str = "settings";

const RECENT_FILES_FILE: &str = "recent_files.txt";
const RECENT_WORKSPACES_FILE: &str = "recent_workspaces.txt";

/// Persisted state of one open tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    /// Path of the open file.
    pub path: String,
    /// Byte offset of the primary cursor.
    #[serde(default)]
    pub cursor_pos: usize,
    /// Top line of the tab's viewport.
    #[serde(default)]
    pub scroll_offset: usize,
}

/// Persisted state of a whole workspace session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceState {
    /// Workspace root directory.
    #[serde(default)]
    pub root_directory: String,
    /// Additional root folders shown by the host.
    #[serde(default)]
    pub root_folders: Vec<String>,
    /// One entry per open tab.
    #[serde(default)]
    pub open_files: Vec<FileState>,
    /// Index of the active tab.
    #[serde(default)]
    pub active_tab_index: usize,
}

impl WorkspaceState {
    /// Serialise to `path` as JSON.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|err| CoreError::InvalidArgument(err.to_string()))?;
        fs::write(path, json).map_err(|err| CoreError::io(path, err))
    }

    /// Deserialise from `path`. Unknown JSON fields are ignored.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = fs::read_to_string(path).map_err(|err| CoreError::io(path, err))?;
        serde_json::from_str(&text)
            .map_err(|err| CoreError::InvalidArgument(format!("malformed workspace file: {}", err)))
    }
}

/// Workspace state files plus the per-user recent-file/workspace stores.
#[derive(Debug)]
pub struct WorkspaceManager {
    config_dir: PathBuf,
    recent_files: Vec<PathBuf>,
    recent_workspaces: Vec<PathBuf>,
}

impl WorkspaceManager {
    /// Maximum retained recent files.
    pub const MAX_RECENT_FILES: usize = 20;
    /// Maximum retained recent workspaces.
    pub const MAX_RECENT_WORKSPACES: usize = 10;

    /// A manager persisting its recent lists under `config_dir`. Existing
    /// lists are loaded immediately.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        let mut manager = Self {
            config_dir: config_dir.into(),
            recent_files: Vec::new(),
            recent_workspaces: Vec::new(),
        };
        manager.load_recent_lists();
        manager
    }

    /// Path of the state file for `workspace_dir`.
    pub fn workspace_file(workspace_dir: &Path) -> PathBuf {
        workspace_dir.join(WORKSPACE_DIR).join(WORKSPACE_FILE)
    }

    /// Path of the optional settings file for `workspace_dir`.
    pub fn settings_file(workspace_dir: &Path) -> PathBuf {
        workspace_dir.join(WORKSPACE_DIR).join(SETTINGS_FILE)
    }

    /// Persist `state` for `workspace_dir`, creating the state directory as
    /// needed, and record the workspace as recently used.
    pub fn save_workspace(&mut self, state: &WorkspaceState, workspace_dir: &Path) -> CoreResult<()> {
        let file = Self::workspace_file(workspace_dir);
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir).map_err(|err| CoreError::io(dir, err))?;
        }
        state.save(&file)?;

        self.add_recent_workspace(workspace_dir);
        self.save_recent_lists();
        Ok(())
    }

    /// Load the persisted state of `workspace_dir` and apply the load
    /// policy: open files whose paths no longer exist are dropped, and the
    /// active index clamps to the last remaining tab.
    pub fn load_workspace(&mut self, workspace_dir: &Path) -> CoreResult<WorkspaceState> {
        let file = Self::workspace_file(workspace_dir);
        let mut state = WorkspaceState::load(&file)?;

        state.open_files.retain(|f| Path::new(&f.path).exists());
        if !state.open_files.is_empty() && state.active_tab_index >= state.open_files.len() {
            state.active_tab_index = state.open_files.len() - 1;
        }

        self.add_recent_workspace(workspace_dir);
        self.save_recent_lists();
        Ok(state)
    }

    /// Record `path` as the most recently used file and persist the list.
    pub fn add_recent_file(&mut self, path: &Path) {
        let normalized = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        add_to_mru(&mut self.recent_files, normalized, Self::MAX_RECENT_FILES);
        self.save_recent_lists();
    }

    /// Record `workspace_dir` as the most recently used workspace.
    pub fn add_recent_workspace(&mut self, workspace_dir: &Path) {
        let normalized =
            fs::canonicalize(workspace_dir).unwrap_or_else(|_| workspace_dir.to_path_buf());
        add_to_mru(
            &mut self.recent_workspaces,
            normalized,
            Self::MAX_RECENT_WORKSPACES,
        );
    }

    /// Recently used files, most recent first.
    pub fn recent_files(&self) -> &[PathBuf] {
        &self.recent_files
    }

    /// Recently used workspaces, most recent first.
    pub fn recent_workspaces(&self) -> &[PathBuf] {
        &self.recent_workspaces
    }

    /// Forget all recent files and persist the empty list.
    pub fn clear_recent_files(&mut self) {
        self.recent_files.clear();
        self.save_recent_lists();
    }

    /// Forget all recent workspaces and persist the empty list.
    pub fn clear_recent_workspaces(&mut self) {
        self.recent_workspaces.clear();
        self.save_recent_lists();
    }

    /// Write both recent lists under the config directory. Failures are
    /// logged and swallowed; losing a recent list is not an error the caller
    /// can act on.
    pub fn save_recent_lists(&self) {
        if let Err(err) = fs::create_dir_all(&self.config_dir) {
            tracing::warn!(dir = %self.config_dir.display(), %err, "cannot create config dir");
            return;
        }

        let write = |name: &str, entries: &[PathBuf]| {
            let mut text = String::new();
            for path in entries {
                text.push_str(&path.to_string_lossy());
                text.push('\n');
            }
            let file = self.config_dir.join(name);
            if let Err(err) = fs::write(&file, text) {
                tracing::warn!(file = %file.display(), %err, "cannot save recent list");
            }
        };

        write(RECENT_FILES_FILE, &self.recent_files);
        write(RECENT_WORKSPACES_FILE, &self.recent_workspaces);
    }

    /// Re-read both recent lists, dropping blank lines and entries that no
    /// longer exist on disk.
    pub fn load_recent_lists(&mut self) {
        let read = |name: &str, max: usize| -> Vec<PathBuf> {
            let Ok(text) = fs::read_to_string(self.config_dir.join(name)) else {
                return Vec::new();
            };
            text.lines()
                .filter(|line| !line.trim().is_empty())
                .map(PathBuf::from)
                .filter(|path| path.exists())
                .take(max)
                .collect()
        };

        self.recent_files = read(RECENT_FILES_FILE, Self::MAX_RECENT_FILES);
        self.recent_workspaces = read(RECENT_WORKSPACES_FILE, Self::MAX_RECENT_WORKSPACES);
    }
}

// Move-to-front with dedup and a size bound.
fn add_to_mru(list: &mut Vec<PathBuf>, item: PathBuf, max: usize) {
    if let Some(existing) = list.iter().position(|p| *p == item) {
        list.remove(existing);
    }
    list.insert(0, item);
    list.truncate(max);
}
