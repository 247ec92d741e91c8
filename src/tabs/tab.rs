//! Runtime tab state.

use crate::files::Encoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Tab Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque tab identifier, unique within one [`TabManager`](super::TabManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub(crate) u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Language Detection
// ─────────────────────────────────────────────────────────────────────────────

/// Content type inferred from the file extension.
///
/// Only used to configure the editing surface; it never affects tab
/// lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Markdown,
    Json,
    Yaml,
    Toml,
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Html,
    Css,
    #[default]
    PlainText,
}

impl Language {
    /// Detect the language from a file path based on extension.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or_default()
    }

    /// Detect the language from a file extension string.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "md" | "markdown" | "mdown" | "mkd" => Self::Markdown,
            "json" | "jsonc" => Self::Json,
            "yaml" | "yml" => Self::Yaml,
            "toml" => Self::Toml,
            "rs" => Self::Rust,
            "py" => Self::Python,
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "tsx" => Self::TypeScript,
            "html" | "htm" => Self::Html,
            "css" | "scss" => Self::Css,
            _ => Self::PlainText,
        }
    }

    /// Get a display name for this language.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Markdown => "Markdown",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::Rust => "Rust",
            Self::Python => "Python",
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Html => "HTML",
            Self::Css => "CSS",
            Self::PlainText => "Plain Text",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tab Spec
// ─────────────────────────────────────────────────────────────────────────────

/// Everything needed to open a new tab.
#[derive(Debug, Clone, Default)]
pub struct TabSpec {
    pub path: Option<PathBuf>,
    pub content: String,
    pub encoding: Encoding,
    /// Restored from a session entry whose file could not be found
    pub missing: bool,
}

impl TabSpec {
    /// An empty, unsaved document.
    pub fn untitled() -> Self {
        Self::default()
    }

    /// A document backed by `path`.
    pub fn file(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn missing(mut self) -> Self {
        self.missing = true;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tab State (Runtime)
// ─────────────────────────────────────────────────────────────────────────────

/// Title used for documents without a path.
pub const UNTITLED: &str = "Untitled";

/// Runtime state for an open tab.
///
/// Tabs are only handed out by shared reference; every mutation goes
/// through the [`TabManager`](super::TabManager) so its invariants hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    /// Unique identifier for this tab
    pub id: TabId,
    /// File path (None for unsaved/new documents)
    pub path: Option<PathBuf>,
    /// Display name (basename or "Untitled")
    pub title: String,
    /// Document content
    pub content: String,
    /// Whether the content differs from the last saved/loaded state
    pub is_modified: bool,
    /// Pinned state (bulk close still removes pinned tabs)
    pub is_pinned: bool,
    /// Whether this is the active tab
    pub is_active: bool,
    /// Inferred content type
    pub language: Language,
    /// Encoding the content was decoded from
    pub encoding: Encoding,
    /// Logical timestamp of the last activation or edit
    pub last_accessed: u64,
    /// Placeholder for a session entry whose file could not be found
    pub missing: bool,
}

impl Tab {
    pub(crate) fn from_spec(id: TabId, spec: TabSpec, now: u64) -> Self {
        let language = spec
            .path
            .as_deref()
            .map(Language::from_path)
            .unwrap_or_default();
        Self {
            id,
            title: title_for(spec.path.as_deref()),
            path: spec.path,
            content: spec.content,
            is_modified: false,
            is_pinned: false,
            is_active: false,
            language,
            encoding: spec.encoding,
            last_accessed: now,
            missing: spec.missing,
        }
    }

    /// Title with a trailing `*` when the tab has unsaved changes.
    pub fn display_title(&self) -> String {
        if self.is_modified {
            format!("{}*", self.title)
        } else {
            self.title.clone()
        }
    }

    pub fn is_untitled(&self) -> bool {
        self.path.is_none()
    }

    /// Point the tab at a new path (e.g. "Save As").
    pub(crate) fn set_path(&mut self, path: PathBuf) {
        self.title = title_for(Some(&path));
        self.language = Language::from_path(&path);
        self.path = Some(path);
        self.missing = false;
    }
}

/// Basename of `path`, or "Untitled".
pub fn title_for(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| UNTITLED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("md"), Language::Markdown);
        assert_eq!(Language::from_extension("MD"), Language::Markdown);
        assert_eq!(Language::from_extension("json"), Language::Json);
        assert_eq!(Language::from_extension("yml"), Language::Yaml);
        assert_eq!(Language::from_extension("toml"), Language::Toml);
        assert_eq!(Language::from_extension("rs"), Language::Rust);
        assert_eq!(Language::from_extension("tsx"), Language::TypeScript);
        assert_eq!(Language::from_extension("weird"), Language::PlainText);
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(
            Language::from_path(Path::new("readme.md")),
            Language::Markdown
        );
        assert_eq!(Language::from_path(Path::new("Cargo.toml")), Language::Toml);
        assert_eq!(
            Language::from_path(Path::new("no_extension")),
            Language::PlainText
        );
    }

    #[test]
    fn test_tab_from_spec() {
        let tab = Tab::from_spec(TabId(7), TabSpec::file("/notes/todo.md", "- [ ] x"), 3);

        assert_eq!(tab.id, TabId(7));
        assert_eq!(tab.title, "todo.md");
        assert_eq!(tab.language, Language::Markdown);
        assert_eq!(tab.last_accessed, 3);
        assert!(!tab.is_modified);
        assert!(!tab.is_pinned);
    }

    #[test]
    fn test_untitled_tab() {
        let tab = Tab::from_spec(TabId(1), TabSpec::untitled(), 0);
        assert!(tab.is_untitled());
        assert_eq!(tab.title, UNTITLED);
        assert_eq!(tab.language, Language::PlainText);
    }

    #[test]
    fn test_display_title_marks_modified() {
        let mut tab = Tab::from_spec(TabId(1), TabSpec::file("/a/b.json", "{}"), 0);
        assert_eq!(tab.display_title(), "b.json");
        tab.is_modified = true;
        assert_eq!(tab.display_title(), "b.json*");
    }

    #[test]
    fn test_set_path_updates_title_and_language() {
        let mut tab = Tab::from_spec(TabId(1), TabSpec::untitled(), 0);
        tab.set_path(PathBuf::from("/tmp/config.yaml"));
        assert_eq!(tab.title, "config.yaml");
        assert_eq!(tab.language, Language::Yaml);
    }

    #[test]
    fn test_tab_id_display() {
        assert_eq!(TabId(12).to_string(), "tab-12");
    }
}
