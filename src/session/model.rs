//! Persisted session records.

use super::migration::CURRENT_SCHEMA_VERSION;
use super::recovery::MISSING_FILE_MARKER;
use crate::config::{EditorSettings, WindowState};
use crate::editor::{CursorPosition, EditorViewState, ScrollPosition, Selection, TabViewState};
use crate::files::Encoding;
use crate::tabs::{Language, Tab, TabId, TabManager};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Open File State
// ─────────────────────────────────────────────────────────────────────────────

/// One tab as written into a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenFileState {
    /// Path on disk; empty for untitled documents, prefixed with
    /// [`MISSING_FILE_MARKER`] when the file could not be found
    pub file_path: String,
    pub tab_id: TabId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_modified: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub cursor: CursorPosition,
    #[serde(default)]
    pub scroll: ScrollPosition,
    #[serde(default)]
    pub selections: Vec<Selection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_state: Option<EditorViewState>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub encoding: Encoding,
}

impl OpenFileState {
    pub fn from_tab(tab: &Tab, view: Option<&TabViewState>) -> Self {
        let path = tab
            .path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_path = if tab.missing && !path.is_empty() {
            format!("{}{}", MISSING_FILE_MARKER, path)
        } else {
            path
        };
        let view = view.cloned().unwrap_or_default();

        Self {
            file_path,
            tab_id: tab.id,
            title: tab.title.clone(),
            content: tab.content.clone(),
            is_modified: tab.is_modified,
            is_pinned: tab.is_pinned,
            cursor: view.cursor,
            scroll: view.scroll,
            selections: view.selections,
            view_state: view.native,
            language: tab.language,
            encoding: tab.encoding,
        }
    }

    pub fn is_untitled(&self) -> bool {
        self.file_path.is_empty()
    }

    /// Whether recovery gave up on this entry.
    pub fn is_missing(&self) -> bool {
        self.file_path.starts_with(MISSING_FILE_MARKER)
    }

    /// The file path with any missing-file marker stripped.
    pub fn original_path(&self) -> &str {
        self.file_path
            .strip_prefix(MISSING_FILE_MARKER)
            .unwrap_or(&self.file_path)
    }

    /// The file path, or `None` for untitled documents.
    pub fn path(&self) -> Option<PathBuf> {
        let path = self.original_path();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    pub fn view_state(&self) -> TabViewState {
        TabViewState {
            cursor: self.cursor,
            scroll: self.scroll,
            selections: self.selections.clone(),
            native: self.view_state.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Workspace Session
// ─────────────────────────────────────────────────────────────────────────────

/// A complete workspace snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSession {
    pub id: String,
    pub name: String,
    /// Last time the snapshot changed
    pub timestamp: DateTime<Utc>,
    /// Last time the session was opened
    pub last_accessed: DateTime<Utc>,
    #[serde(default)]
    pub folder_paths: Vec<PathBuf>,
    #[serde(default)]
    pub open_files: Vec<OpenFileState>,
    #[serde(default)]
    pub active_tab_id: Option<TabId>,
    #[serde(default)]
    pub window_state: WindowState,
    #[serde(default)]
    pub editor_settings: EditorSettings,
    pub version: u32,
}

impl WorkspaceSession {
    /// A new, empty session with a fresh id.
    pub fn new(name: impl Into<String>, window: WindowState, editor: EditorSettings) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            timestamp: now,
            last_accessed: now,
            folder_paths: Vec::new(),
            open_files: Vec::new(),
            active_tab_id: None,
            window_state: window,
            editor_settings: editor,
            version: CURRENT_SCHEMA_VERSION,
        }
    }

    /// Build the next snapshot of this session from live state.
    ///
    /// Keeps id, name and folders; the timestamp strictly increases.
    pub fn capture(
        &self,
        tabs: &TabManager,
        window: &WindowState,
        editor: &EditorSettings,
    ) -> WorkspaceSession {
        let mut next = self.clone();
        next.open_files = tabs
            .tabs()
            .iter()
            .map(|tab| OpenFileState::from_tab(tab, tabs.view_state(tab.id)))
            .collect();
        next.active_tab_id = tabs.active_id();
        next.window_state = *window;
        next.editor_settings = editor.clone();
        next.version = CURRENT_SCHEMA_VERSION;
        next.touch();
        next
    }

    /// Bump `timestamp`, never moving it backwards or leaving it equal.
    pub fn touch(&mut self) {
        let floor = self.timestamp + chrono::Duration::milliseconds(1);
        self.timestamp = Utc::now().max(floor);
    }

    pub fn add_folder(&mut self, folder: PathBuf) -> bool {
        if self.folder_paths.contains(&folder) {
            return false;
        }
        self.folder_paths.push(folder);
        true
    }

    pub fn missing_count(&self) -> usize {
        self.open_files.iter().filter(|f| f.is_missing()).count()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            timestamp: self.timestamp,
            last_accessed: self.last_accessed,
            open_file_count: self.open_files.len(),
            folder_paths: self.folder_paths.clone(),
        }
    }
}

/// Listing entry for the session picker.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub open_file_count: usize,
    pub folder_paths: Vec<PathBuf>,
}
