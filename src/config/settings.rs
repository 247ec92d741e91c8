//! User settings and preferences
//!
//! This module defines the `Settings` struct that holds all user-configurable
//! options, with serde support for JSON persistence. The editor and window
//! preference blocks are also embedded in every saved workspace session.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Theme Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Available color themes for the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

// ─────────────────────────────────────────────────────────────────────────────
// Font Family Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Available font families for the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditorFont {
    /// Inter - Modern, clean UI font (default)
    #[default]
    Inter,
    /// JetBrains Mono - Monospace font, good for code-heavy documents
    JetBrainsMono,
}

impl EditorFont {
    /// Get the display name for the font.
    pub fn display_name(&self) -> &'static str {
        match self {
            EditorFont::Inter => "Inter",
            EditorFont::JetBrainsMono => "JetBrains Mono",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Editor Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Editor preferences handed to the external editing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Color theme (light, dark, or system)
    pub theme: Theme,
    /// Font family for the editor
    pub font_family: EditorFont,
    /// Font size for the editor (in points)
    pub font_size: f32,
    /// Tab size (number of spaces)
    pub tab_size: u8,
    /// Whether to use spaces instead of tabs
    pub use_spaces: bool,
    /// Whether to enable word wrap
    pub word_wrap: bool,
    /// Whether to show line numbers in the editor
    pub show_line_numbers: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font_family: EditorFont::default(),
            font_size: 14.0,
            tab_size: 4,
            use_spaces: true,
            word_wrap: true,
            show_line_numbers: true,
        }
    }
}

impl EditorSettings {
    /// Minimum allowed font size.
    pub const MIN_FONT_SIZE: f32 = 8.0;
    /// Maximum allowed font size.
    pub const MAX_FONT_SIZE: f32 = 72.0;
    /// Minimum allowed tab size.
    pub const MIN_TAB_SIZE: u8 = 1;
    /// Maximum allowed tab size.
    pub const MAX_TAB_SIZE: u8 = 8;

    /// Clamp values to valid ranges.
    pub fn sanitize(&mut self) {
        self.font_size = self
            .font_size
            .clamp(Self::MIN_FONT_SIZE, Self::MAX_FONT_SIZE);
        self.tab_size = self.tab_size.clamp(Self::MIN_TAB_SIZE, Self::MAX_TAB_SIZE);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Window State
// ─────────────────────────────────────────────────────────────────────────────

/// Window geometry and chrome visibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowState {
    /// Window width in pixels
    pub width: f32,
    /// Window height in pixels
    pub height: f32,
    /// Window X position (optional, for restoring position)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    /// Window Y position (optional, for restoring position)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// Whether the window was maximized
    pub maximized: bool,
    /// Whether the sidebar (file tree) is visible
    pub sidebar_visible: bool,
    /// Whether the status bar is visible
    pub status_bar_visible: bool,
    /// UI zoom factor (1.0 = 100%)
    pub zoom_level: f32,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            x: None,
            y: None,
            maximized: false,
            sidebar_visible: true,
            status_bar_visible: true,
            zoom_level: 1.0,
        }
    }
}

impl WindowState {
    /// Minimum window dimension.
    pub const MIN_WINDOW_SIZE: f32 = 200.0;
    /// Maximum window dimension.
    pub const MAX_WINDOW_SIZE: f32 = 10000.0;
    /// Minimum zoom factor.
    pub const MIN_ZOOM: f32 = 0.5;
    /// Maximum zoom factor.
    pub const MAX_ZOOM: f32 = 3.0;

    /// Clamp values to valid ranges.
    pub fn sanitize(&mut self) {
        self.width = self
            .width
            .clamp(Self::MIN_WINDOW_SIZE, Self::MAX_WINDOW_SIZE);
        self.height = self
            .height
            .clamp(Self::MIN_WINDOW_SIZE, Self::MAX_WINDOW_SIZE);
        self.zoom_level = self.zoom_level.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences and application settings.
///
/// This struct is serialized to JSON and persisted to the user's config directory.
/// All fields have sensible defaults via the `Default` trait and `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Defaults for new sessions
    // ─────────────────────────────────────────────────────────────────────────
    /// Editor preferences
    pub editor: EditorSettings,

    /// Window size, position and chrome
    pub window: WindowState,

    // ─────────────────────────────────────────────────────────────────────────
    // Session Persistence
    // ─────────────────────────────────────────────────────────────────────────
    /// Whether to periodically snapshot and save the current session
    pub auto_save: bool,

    /// Auto-save interval in seconds (if auto_save is enabled)
    pub auto_save_interval_secs: u32,

    /// Whether every session save also refreshes the backup slot
    pub backups_enabled: bool,

    /// Trailing-edge debounce applied to session and preference writes
    pub persist_debounce_ms: u64,

    /// Whether to reopen the last session on startup
    pub restore_last_session: bool,

    /// Id of the session that was current at last shutdown
    pub last_session_id: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────────
    /// Recently opened files (most recent first)
    pub recent_files: Vec<PathBuf>,

    /// Maximum number of recent files to remember
    pub max_recent_files: usize,

    /// Recently opened workspaces (folders), most recent first
    pub recent_workspaces: Vec<PathBuf>,

    /// Maximum number of recent workspaces to remember
    pub max_recent_workspaces: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            editor: EditorSettings::default(),
            window: WindowState::default(),

            // Session Persistence
            auto_save: true,
            auto_save_interval_secs: 30,
            backups_enabled: true,
            persist_debounce_ms: 500,
            restore_last_session: true,
            last_session_id: None,

            // History
            recent_files: Vec::new(),
            max_recent_files: 10,
            recent_workspaces: Vec::new(),
            max_recent_workspaces: 10,
        }
    }
}

impl Settings {
    /// Minimum auto-save interval when auto-save is enabled.
    pub const MIN_AUTO_SAVE_INTERVAL_SECS: u32 = 5;
    /// Upper bound for the persistence debounce.
    pub const MAX_PERSIST_DEBOUNCE_MS: u64 = 10_000;

    /// Add a file to the recent files list.
    ///
    /// If the file already exists in the list, it's moved to the front.
    /// The list is trimmed to `max_recent_files`.
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(self.max_recent_files);
    }

    /// Add a workspace (folder) to the recent workspaces list.
    pub fn add_recent_workspace(&mut self, path: PathBuf) {
        self.recent_workspaces.retain(|p| p != &path);
        self.recent_workspaces.insert(0, path);
        self.recent_workspaces.truncate(self.max_recent_workspaces);
    }

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        self.editor.sanitize();
        self.window.sanitize();

        if self.max_recent_files == 0 {
            self.max_recent_files = 10;
        } else if self.max_recent_files > 100 {
            self.max_recent_files = 100;
        }
        self.recent_files.truncate(self.max_recent_files);

        if self.max_recent_workspaces == 0 {
            self.max_recent_workspaces = 10;
        } else if self.max_recent_workspaces > 100 {
            self.max_recent_workspaces = 100;
        }
        self.recent_workspaces.truncate(self.max_recent_workspaces);

        if self.auto_save && self.auto_save_interval_secs < Self::MIN_AUTO_SAVE_INTERVAL_SECS {
            self.auto_save_interval_secs = Self::MIN_AUTO_SAVE_INTERVAL_SECS;
        }

        self.persist_debounce_ms = self.persist_debounce_ms.min(Self::MAX_PERSIST_DEBOUNCE_MS);

        if matches!(&self.last_session_id, Some(id) if id.trim().is_empty()) {
            self.last_session_id = None;
        }
    }

    /// Load settings and sanitize them to ensure validity.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.editor.theme, Theme::Light);
        assert!(settings.editor.show_line_numbers);
        assert_eq!(settings.editor.font_size, 14.0);
        assert!(settings.recent_files.is_empty());
        assert_eq!(settings.max_recent_files, 10);
        assert_eq!(settings.window.width, 1200.0);
        assert_eq!(settings.window.height, 800.0);
        assert!(settings.backups_enabled);
        assert!(settings.last_session_id.is_none());
    }

    #[test]
    fn test_add_recent_file() {
        let mut settings = Settings::default();
        settings.max_recent_files = 3;

        settings.add_recent_file(PathBuf::from("/file1.md"));
        settings.add_recent_file(PathBuf::from("/file2.md"));
        settings.add_recent_file(PathBuf::from("/file3.md"));

        assert_eq!(settings.recent_files.len(), 3);
        assert_eq!(settings.recent_files[0], PathBuf::from("/file3.md"));
        assert_eq!(settings.recent_files[2], PathBuf::from("/file1.md"));

        // Add existing file - should move to front
        settings.add_recent_file(PathBuf::from("/file1.md"));
        assert_eq!(settings.recent_files[0], PathBuf::from("/file1.md"));
        assert_eq!(settings.recent_files.len(), 3);

        // Add new file - should trim oldest
        settings.add_recent_file(PathBuf::from("/file4.md"));
        assert_eq!(settings.recent_files.len(), 3);
        assert_eq!(settings.recent_files[0], PathBuf::from("/file4.md"));
        assert!(!settings.recent_files.contains(&PathBuf::from("/file2.md")));
    }

    #[test]
    fn test_add_recent_workspace_dedupes() {
        let mut settings = Settings::default();
        settings.add_recent_workspace(PathBuf::from("/a"));
        settings.add_recent_workspace(PathBuf::from("/b"));
        settings.add_recent_workspace(PathBuf::from("/a"));

        assert_eq!(
            settings.recent_workspaces,
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn test_theme_serialization() {
        assert_eq!(serde_json::to_string(&Theme::Light).unwrap(), "\"light\"");
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        assert_eq!(serde_json::to_string(&Theme::System).unwrap(), "\"system\"");
    }

    #[test]
    fn test_sanitize_clamps_values() {
        let mut settings = Settings::default();
        settings.editor.font_size = 2.0;
        settings.editor.tab_size = 100;
        settings.window.width = 50.0;
        settings.window.zoom_level = 9.0;
        settings.auto_save_interval_secs = 1;
        settings.persist_debounce_ms = 1_000_000;
        settings.last_session_id = Some("  ".to_string());

        settings.sanitize();

        assert_eq!(settings.editor.font_size, EditorSettings::MIN_FONT_SIZE);
        assert_eq!(settings.editor.tab_size, EditorSettings::MAX_TAB_SIZE);
        assert_eq!(settings.window.width, WindowState::MIN_WINDOW_SIZE);
        assert_eq!(settings.window.zoom_level, WindowState::MAX_ZOOM);
        assert_eq!(
            settings.auto_save_interval_secs,
            Settings::MIN_AUTO_SAVE_INTERVAL_SECS
        );
        assert_eq!(
            settings.persist_debounce_ms,
            Settings::MAX_PERSIST_DEBOUNCE_MS
        );
        assert!(settings.last_session_id.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings =
            Settings::from_json_sanitized(r#"{"editor": {"theme": "dark"}, "auto_save": false}"#)
                .unwrap();

        assert_eq!(settings.editor.theme, Theme::Dark);
        assert_eq!(settings.editor.font_size, 14.0);
        assert!(!settings.auto_save);
        assert!(settings.window.sidebar_visible);
    }

    #[test]
    fn test_window_state_skips_unset_position() {
        let json = serde_json::to_string(&WindowState::default()).unwrap();
        assert!(!json.contains("\"x\""));
        assert!(!json.contains("\"y\""));
    }
}
